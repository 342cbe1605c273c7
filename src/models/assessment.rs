use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::blueprint::Blueprint;
use crate::models::question::Question;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Assessment {
    pub id: Uuid,
    pub user_id: Uuid,
    #[serde(flatten)]
    pub blueprint: Blueprint,
    pub questions: Vec<Question>,
    pub created_at: DateTime<Utc>,
}

impl Assessment {
    pub fn from_blueprint(user_id: Uuid, blueprint: Blueprint, questions: Vec<Question>) -> Self {
        Self {
            id: Uuid::new_v4(),
            user_id,
            blueprint,
            questions,
            created_at: Utc::now(),
        }
    }
}
