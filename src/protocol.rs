//! IPC protocol definitions (JSON messages)

use crate::accessor::PriorityLevel;
use crate::policy::PolicyConfig;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "cmd", rename_all = "snake_case")]
pub enum Request {
    Ping,
    GetSnapshot,
    GetLog { params: GetLogParams },
    GetPolicy,
    BoostProcess { params: BoostParams },
    KillProcess { params: KillParams },
    UpdatePolicy { params: PolicyConfig },
    Stop,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GetLogParams {
    pub limit: Option<u32>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BoostParams {
    pub pid: u32,
    pub level: PriorityLevel,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KillParams {
    pub pid: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Response {
    Pong,
    Response {
        id: Option<String>,
        data: serde_json::Value,
    },
    Status {
        data: StatusData,
    },
}

/// Pushed to connected clients after every pass.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatusData {
    pub process_count: u32,
    pub boost_count: u64,
}
