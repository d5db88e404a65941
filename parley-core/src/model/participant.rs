use crate::model::connection::ConnectionId;
use serde::{Deserialize, Serialize};

/// One connection's presence in one voice room.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Participant {
    pub connection_id: ConnectionId,
    pub user_id: String,
    pub display_name: String,
}
