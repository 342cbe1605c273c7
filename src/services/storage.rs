use std::collections::HashMap;
use std::sync::RwLock;

use async_trait::async_trait;
use uuid::Uuid;

use crate::error::Result;
use crate::models::assessment::Assessment;
use crate::models::submission::Submission;

/// Persistence seam. Assessments and submissions are always scoped to the
/// owning user; lookups with the wrong user behave like a miss.
#[async_trait]
pub trait Storage: Send + Sync {
    async fn create_assessment(&self, assessment: Assessment) -> Result<Assessment>;
    async fn find_assessment(&self, id: Uuid, user_id: Uuid) -> Result<Option<Assessment>>;
    async fn list_assessments(&self, user_id: Uuid) -> Result<Vec<Assessment>>;

    async fn create_submission(&self, submission: Submission) -> Result<Submission>;
    async fn find_submission(&self, id: Uuid, user_id: Uuid) -> Result<Option<Submission>>;
    async fn list_submissions(&self, user_id: Uuid, assessment_id: Uuid)
        -> Result<Vec<Submission>>;
}

/// In-process store. Listings come back newest first.
#[derive(Default)]
pub struct MemoryStore {
    assessments: RwLock<HashMap<Uuid, Assessment>>,
    submissions: RwLock<HashMap<Uuid, Submission>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl Storage for MemoryStore {
    async fn create_assessment(&self, assessment: Assessment) -> Result<Assessment> {
        let mut guard = self.assessments.write().expect("assessment store poisoned");
        guard.insert(assessment.id, assessment.clone());
        Ok(assessment)
    }

    async fn find_assessment(&self, id: Uuid, user_id: Uuid) -> Result<Option<Assessment>> {
        let guard = self.assessments.read().expect("assessment store poisoned");
        Ok(guard
            .get(&id)
            .filter(|a| a.user_id == user_id)
            .cloned())
    }

    async fn list_assessments(&self, user_id: Uuid) -> Result<Vec<Assessment>> {
        let guard = self.assessments.read().expect("assessment store poisoned");
        let mut list: Vec<Assessment> = guard
            .values()
            .filter(|a| a.user_id == user_id)
            .cloned()
            .collect();
        list.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(list)
    }

    async fn create_submission(&self, submission: Submission) -> Result<Submission> {
        let mut guard = self.submissions.write().expect("submission store poisoned");
        guard.insert(submission.id, submission.clone());
        Ok(submission)
    }

    async fn find_submission(&self, id: Uuid, user_id: Uuid) -> Result<Option<Submission>> {
        let guard = self.submissions.read().expect("submission store poisoned");
        Ok(guard
            .get(&id)
            .filter(|s| s.user_id == user_id)
            .cloned())
    }

    async fn list_submissions(
        &self,
        user_id: Uuid,
        assessment_id: Uuid,
    ) -> Result<Vec<Submission>> {
        let guard = self.submissions.read().expect("submission store poisoned");
        let mut list: Vec<Submission> = guard
            .values()
            .filter(|s| s.user_id == user_id && s.assessment_id == assessment_id)
            .cloned()
            .collect();
        list.sort_by(|a, b| b.completed_at.cmp(&a.completed_at));
        Ok(list)
    }
}
