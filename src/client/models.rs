//! Request and response bodies of the platform API

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Name and namespace of a deployable function
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FunctionIdentity {
    pub name: String,
    pub namespace: String,
}

impl FunctionIdentity {
    pub fn new(name: impl Into<String>, namespace: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            namespace: namespace.into(),
        }
    }

    /// Creation payload for this function
    pub fn creation(&self, code: impl Into<String>, image: impl Into<String>) -> FunctionCreation {
        FunctionCreation {
            name: self.name.clone(),
            namespace: self.namespace.clone(),
            code: code.into(),
            image: image.into(),
        }
    }

    /// Invocation payload; `None` leaves `args` out of the body
    pub fn invocation(&self, args: Option<HashMap<String, String>>) -> FunctionInvocation {
        FunctionInvocation {
            function: self.name.clone(),
            namespace: self.namespace.clone(),
            args,
        }
    }

    pub fn deletion(&self) -> FunctionDeletion {
        FunctionDeletion {
            name: self.name.clone(),
            namespace: self.namespace.clone(),
        }
    }
}

/// `POST /create`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FunctionCreation {
    pub name: String,
    pub namespace: String,
    pub code: String,
    pub image: String,
}

/// `POST /invoke`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FunctionInvocation {
    pub function: String,
    pub namespace: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub args: Option<HashMap<String, String>>,
}

/// `POST /delete`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FunctionDeletion {
    pub name: String,
    pub namespace: String,
}

/// `POST /list`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FunctionListing {
    pub namespace: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreationSuccess {
    pub result: String,
}

/// Whatever the function returned; absent when the platform sent no result
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InvocationSuccess {
    #[serde(default)]
    pub result: Option<serde_json::Value>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeletionSuccess {
    pub result: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListSuccess {
    #[serde(default)]
    pub result: Vec<String>,
}

/// Error body returned by the platform on non-2xx responses
#[derive(Debug, Deserialize)]
pub(crate) struct ErrorBody {
    pub error: serde_json::Value,
}
