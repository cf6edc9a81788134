use chrono::{DateTime, Utc};
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DbErr, EntityTrait, QueryFilter, QueryOrder,
    Set,
};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use crate::{entities::submission, models::ids};

#[derive(Debug, Error)]
pub enum SubmissionError {
    #[error(transparent)]
    Database(#[from] DbErr),
    #[error("Submission not found")]
    NotFound,
    #[error("Workshop not found")]
    WorkshopNotFound,
    #[error("Profile answers were already submitted for this submission")]
    ProfileAlreadySubmitted,
    #[error("Original image was already stored for this submission")]
    ImageAlreadyStored,
    #[error("Stale write to {part} fields; reload and retry")]
    VersionConflict { part: &'static str },
}

/// One participant journey. The row is split into three sub-documents with
/// disjoint owners; each carries its own optimistic version stamp so an
/// overlapping or stale write fails instead of silently racing.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Submission {
    pub id: Uuid,
    pub user_id: Uuid,
    pub workshop_id: Uuid,
    pub organism_type: Option<String>,
    pub color: Option<String>,
    pub size: Option<String>,
    pub quantity: Option<String>,
    pub landscape: Option<String>,
    pub features: Option<String>,
    pub original_image_url: Option<String>,
    pub profile_version: i32,
    pub feedback_answer1: Option<String>,
    pub feedback_answer2: Option<String>,
    pub adjust_organism: Option<bool>,
    pub feedback_version: i32,
    pub ai_description: Option<String>,
    pub feedback_question1: Option<String>,
    pub feedback_question2: Option<String>,
    pub ai_prompt: Option<String>,
    pub ai_model_image_analysis: Option<String>,
    pub ai_model_prompt_generation: Option<String>,
    pub ai_model_image_generation: Option<String>,
    pub ai_image_ratio: Option<String>,
    pub ai_image_url: Option<String>,
    pub summary: Option<String>,
    pub latin_name: Option<String>,
    pub generation_version: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProfileAnswers {
    pub organism_type: String,
    pub color: String,
    pub size: String,
    pub quantity: String,
    pub landscape: String,
    pub features: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FeedbackPatch {
    pub feedback_answer1: Option<String>,
    pub feedback_answer2: Option<String>,
    pub adjust_organism: Option<bool>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GenerationPatch {
    pub ai_description: Option<String>,
    pub feedback_question1: Option<String>,
    pub feedback_question2: Option<String>,
    pub ai_prompt: Option<String>,
    pub ai_model_image_analysis: Option<String>,
    pub ai_model_prompt_generation: Option<String>,
    pub ai_model_image_generation: Option<String>,
    pub ai_image_ratio: Option<String>,
    pub ai_image_url: Option<String>,
    pub summary: Option<String>,
    pub latin_name: Option<String>,
}

impl Submission {
    fn from_model(model: submission::Model, workshop_id: Uuid) -> Self {
        Self {
            id: model.uuid,
            user_id: model.user_id,
            workshop_id,
            organism_type: model.organism_type,
            color: model.color,
            size: model.size,
            quantity: model.quantity,
            landscape: model.landscape,
            features: model.features,
            original_image_url: model.original_image_url,
            profile_version: model.profile_version,
            feedback_answer1: model.feedback_answer1,
            feedback_answer2: model.feedback_answer2,
            adjust_organism: model.adjust_organism,
            feedback_version: model.feedback_version,
            ai_description: model.ai_description,
            feedback_question1: model.feedback_question1,
            feedback_question2: model.feedback_question2,
            ai_prompt: model.ai_prompt,
            ai_model_image_analysis: model.ai_model_image_analysis,
            ai_model_prompt_generation: model.ai_model_prompt_generation,
            ai_model_image_generation: model.ai_model_image_generation,
            ai_image_ratio: model.ai_image_ratio,
            ai_image_url: model.ai_image_url,
            summary: model.summary,
            latin_name: model.latin_name,
            generation_version: model.generation_version,
            created_at: model.created_at.into(),
            updated_at: model.updated_at.into(),
        }
    }

    async fn resolve<C: ConnectionTrait>(
        db: &C,
        model: submission::Model,
    ) -> Result<Self, DbErr> {
        let workshop_uuid = ids::workshop_uuid_by_id(db, model.workshop_id)
            .await?
            .ok_or(DbErr::RecordNotFound("Workshop not found".to_string()))?;
        Ok(Self::from_model(model, workshop_uuid))
    }

    /// Creates a submission holding only identity fields. `original_image_url`
    /// is set when a regenerate flow carries the previous upload forward.
    pub async fn create<C: ConnectionTrait>(
        db: &C,
        user_id: Uuid,
        workshop_id: Uuid,
        original_image_url: Option<String>,
    ) -> Result<Self, SubmissionError> {
        let workshop_row_id = ids::workshop_id_by_uuid(db, workshop_id)
            .await?
            .ok_or(SubmissionError::WorkshopNotFound)?;

        let now = Utc::now();
        let active = submission::ActiveModel {
            uuid: Set(Uuid::new_v4()),
            user_id: Set(user_id),
            workshop_id: Set(workshop_row_id),
            original_image_url: Set(original_image_url),
            profile_version: Set(0),
            feedback_version: Set(0),
            generation_version: Set(0),
            created_at: Set(now),
            updated_at: Set(now),
            ..Default::default()
        };
        let model = active.insert(db).await?;
        Ok(Self::from_model(model, workshop_id))
    }

    pub async fn find_by_uuid<C: ConnectionTrait>(
        db: &C,
        id: Uuid,
    ) -> Result<Option<Self>, DbErr> {
        let record = submission::Entity::find()
            .filter(submission::Column::Uuid.eq(id))
            .one(db)
            .await?;
        match record {
            Some(model) => Ok(Some(Self::resolve(db, model).await?)),
            None => Ok(None),
        }
    }

    /// All submissions for one participant, newest first. Supports the
    /// regenerate flow, which needs the prior attempt's upload reference.
    pub async fn find_latest_for_user<C: ConnectionTrait>(
        db: &C,
        user_id: Uuid,
    ) -> Result<Vec<Self>, DbErr> {
        let records = submission::Entity::find()
            .filter(submission::Column::UserId.eq(user_id))
            .order_by_desc(submission::Column::CreatedAt)
            .order_by_desc(submission::Column::Id)
            .all(db)
            .await?;

        let mut submissions = Vec::with_capacity(records.len());
        for model in records {
            submissions.push(Self::resolve(db, model).await?);
        }
        Ok(submissions)
    }

    pub async fn find_by_workshop<C: ConnectionTrait>(
        db: &C,
        workshop_id: Uuid,
    ) -> Result<Vec<Self>, DbErr> {
        let workshop_row_id = match ids::workshop_id_by_uuid(db, workshop_id).await? {
            Some(id) => id,
            None => return Ok(Vec::new()),
        };

        let records = submission::Entity::find()
            .filter(submission::Column::WorkshopId.eq(workshop_row_id))
            .order_by_desc(submission::Column::CreatedAt)
            .all(db)
            .await?;

        Ok(records
            .into_iter()
            .map(|model| Self::from_model(model, workshop_id))
            .collect())
    }

    /// Writes the organism answers. Write-once: a second write is rejected
    /// regardless of version, and a stale version stamp is rejected loudly.
    pub async fn update_profile<C: ConnectionTrait>(
        db: &C,
        id: Uuid,
        answers: &ProfileAnswers,
        expected_version: i32,
    ) -> Result<Self, SubmissionError> {
        let current = Self::find_by_uuid(db, id)
            .await?
            .ok_or(SubmissionError::NotFound)?;
        if current.organism_type.is_some() {
            return Err(SubmissionError::ProfileAlreadySubmitted);
        }

        let result = submission::Entity::update_many()
            .filter(submission::Column::Uuid.eq(id))
            .filter(submission::Column::ProfileVersion.eq(expected_version))
            .col_expr(
                submission::Column::OrganismType,
                Expr::value(answers.organism_type.clone()),
            )
            .col_expr(submission::Column::Color, Expr::value(answers.color.clone()))
            .col_expr(submission::Column::Size, Expr::value(answers.size.clone()))
            .col_expr(
                submission::Column::Quantity,
                Expr::value(answers.quantity.clone()),
            )
            .col_expr(
                submission::Column::Landscape,
                Expr::value(answers.landscape.clone()),
            )
            .col_expr(
                submission::Column::Features,
                Expr::value(answers.features.clone()),
            )
            .col_expr(
                submission::Column::ProfileVersion,
                Expr::value(expected_version + 1),
            )
            .col_expr(submission::Column::UpdatedAt, Expr::value(Utc::now()))
            .exec(db)
            .await?;

        if result.rows_affected == 0 {
            return Err(SubmissionError::VersionConflict { part: "profile" });
        }

        Self::find_by_uuid(db, id)
            .await?
            .ok_or(SubmissionError::NotFound)
    }

    /// Records the stored upload's public URL on the profile sub-document.
    pub async fn set_original_image<C: ConnectionTrait>(
        db: &C,
        id: Uuid,
        url: &str,
        expected_version: i32,
    ) -> Result<Self, SubmissionError> {
        let current = Self::find_by_uuid(db, id)
            .await?
            .ok_or(SubmissionError::NotFound)?;
        if current.original_image_url.is_some() {
            return Err(SubmissionError::ImageAlreadyStored);
        }

        let result = submission::Entity::update_many()
            .filter(submission::Column::Uuid.eq(id))
            .filter(submission::Column::ProfileVersion.eq(expected_version))
            .col_expr(
                submission::Column::OriginalImageUrl,
                Expr::value(url.to_string()),
            )
            .col_expr(
                submission::Column::ProfileVersion,
                Expr::value(expected_version + 1),
            )
            .col_expr(submission::Column::UpdatedAt, Expr::value(Utc::now()))
            .exec(db)
            .await?;

        if result.rows_affected == 0 {
            return Err(SubmissionError::VersionConflict { part: "profile" });
        }

        Self::find_by_uuid(db, id)
            .await?
            .ok_or(SubmissionError::NotFound)
    }

    /// Patch-updates the feedback sub-document. Fields absent from the patch
    /// keep their stored values.
    pub async fn update_feedback<C: ConnectionTrait>(
        db: &C,
        id: Uuid,
        patch: &FeedbackPatch,
        expected_version: i32,
    ) -> Result<Self, SubmissionError> {
        if Self::find_by_uuid(db, id).await?.is_none() {
            return Err(SubmissionError::NotFound);
        }

        let mut query = submission::Entity::update_many()
            .filter(submission::Column::Uuid.eq(id))
            .filter(submission::Column::FeedbackVersion.eq(expected_version))
            .col_expr(
                submission::Column::FeedbackVersion,
                Expr::value(expected_version + 1),
            )
            .col_expr(submission::Column::UpdatedAt, Expr::value(Utc::now()));

        if let Some(answer) = &patch.feedback_answer1 {
            query = query.col_expr(
                submission::Column::FeedbackAnswer1,
                Expr::value(answer.clone()),
            );
        }
        if let Some(answer) = &patch.feedback_answer2 {
            query = query.col_expr(
                submission::Column::FeedbackAnswer2,
                Expr::value(answer.clone()),
            );
        }
        if let Some(adjust) = patch.adjust_organism {
            query = query.col_expr(submission::Column::AdjustOrganism, Expr::value(adjust));
        }

        let result = query.exec(db).await?;
        if result.rows_affected == 0 {
            return Err(SubmissionError::VersionConflict { part: "feedback" });
        }

        Self::find_by_uuid(db, id)
            .await?
            .ok_or(SubmissionError::NotFound)
    }

    /// Patch-updates the generation sub-document, written only by the
    /// external workflow's callback. Fields move from null to populated and
    /// are never cleared here.
    pub async fn update_generation<C: ConnectionTrait>(
        db: &C,
        id: Uuid,
        patch: &GenerationPatch,
        expected_version: i32,
    ) -> Result<Self, SubmissionError> {
        if Self::find_by_uuid(db, id).await?.is_none() {
            return Err(SubmissionError::NotFound);
        }

        let mut query = submission::Entity::update_many()
            .filter(submission::Column::Uuid.eq(id))
            .filter(submission::Column::GenerationVersion.eq(expected_version))
            .col_expr(
                submission::Column::GenerationVersion,
                Expr::value(expected_version + 1),
            )
            .col_expr(submission::Column::UpdatedAt, Expr::value(Utc::now()));

        macro_rules! apply {
            ($field:ident, $column:ident) => {
                if let Some(value) = &patch.$field {
                    query = query.col_expr(
                        submission::Column::$column,
                        Expr::value(value.clone()),
                    );
                }
            };
        }

        apply!(ai_description, AiDescription);
        apply!(feedback_question1, FeedbackQuestion1);
        apply!(feedback_question2, FeedbackQuestion2);
        apply!(ai_prompt, AiPrompt);
        apply!(ai_model_image_analysis, AiModelImageAnalysis);
        apply!(ai_model_prompt_generation, AiModelPromptGeneration);
        apply!(ai_model_image_generation, AiModelImageGeneration);
        apply!(ai_image_ratio, AiImageRatio);
        apply!(ai_image_url, AiImageUrl);
        apply!(summary, Summary);
        apply!(latin_name, LatinName);

        let result = query.exec(db).await?;
        if result.rows_affected == 0 {
            return Err(SubmissionError::VersionConflict { part: "generation" });
        }

        Self::find_by_uuid(db, id)
            .await?
            .ok_or(SubmissionError::NotFound)
    }

    pub fn questions_ready(&self) -> Option<(String, String)> {
        match (&self.feedback_question1, &self.feedback_question2) {
            (Some(q1), Some(q2)) => Some((q1.clone(), q2.clone())),
            _ => None,
        }
    }

    pub fn image_ready(&self) -> Option<String> {
        self.ai_image_url.clone()
    }
}

#[cfg(test)]
mod tests {
    use sea_orm::Database;
    use sea_orm_migration::MigratorTrait;

    use super::*;
    use crate::models::workshop::{CreateWorkshop, Workshop};

    async fn setup() -> (sea_orm::DatabaseConnection, Workshop) {
        let db = Database::connect("sqlite::memory:").await.unwrap();
        db_migration::Migrator::up(&db, None).await.unwrap();
        let workshop = Workshop::create(
            &db,
            &CreateWorkshop {
                title: "Test".to_string(),
                access_code: "CODE".to_string(),
                active: None,
            },
        )
        .await
        .unwrap();
        (db, workshop)
    }

    fn answers() -> ProfileAnswers {
        ProfileAnswers {
            organism_type: "Mos".to_string(),
            color: "Paars".to_string(),
            size: "1 meter".to_string(),
            quantity: "Solitair".to_string(),
            landscape: "Vulkanisch".to_string(),
            features: "Gloeiend".to_string(),
        }
    }

    #[tokio::test]
    async fn create_holds_identity_fields_only() {
        let (db, workshop) = setup().await;
        let user_id = Uuid::new_v4();

        let submission = Submission::create(&db, user_id, workshop.id, None)
            .await
            .unwrap();

        assert_eq!(submission.user_id, user_id);
        assert_eq!(submission.workshop_id, workshop.id);
        assert!(submission.organism_type.is_none());
        assert_eq!(submission.profile_version, 0);

        let found = Submission::find_by_uuid(&db, submission.id)
            .await
            .unwrap()
            .expect("submission");
        assert_eq!(found.user_id, user_id);
    }

    #[tokio::test]
    async fn profile_write_is_write_once() {
        let (db, workshop) = setup().await;
        let submission = Submission::create(&db, Uuid::new_v4(), workshop.id, None)
            .await
            .unwrap();

        let updated =
            Submission::update_profile(&db, submission.id, &answers(), submission.profile_version)
                .await
                .unwrap();
        assert_eq!(updated.organism_type.as_deref(), Some("Mos"));
        assert_eq!(updated.profile_version, 1);

        let err =
            Submission::update_profile(&db, submission.id, &answers(), updated.profile_version)
                .await
                .unwrap_err();
        assert!(matches!(err, SubmissionError::ProfileAlreadySubmitted));
    }

    #[tokio::test]
    async fn stale_version_stamp_is_rejected() {
        let (db, workshop) = setup().await;
        let submission = Submission::create(&db, Uuid::new_v4(), workshop.id, None)
            .await
            .unwrap();

        Submission::set_original_image(&db, submission.id, "/storage/x.jpg", 0)
            .await
            .unwrap();

        // version is now 1, a writer still holding 0 must fail
        let err = Submission::update_profile(&db, submission.id, &answers(), 0)
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            SubmissionError::VersionConflict { part: "profile" }
        ));
    }

    #[tokio::test]
    async fn feedback_patch_retains_untouched_fields() {
        let (db, workshop) = setup().await;
        let submission = Submission::create(&db, Uuid::new_v4(), workshop.id, None)
            .await
            .unwrap();

        let after_first = Submission::update_feedback(
            &db,
            submission.id,
            &FeedbackPatch {
                feedback_answer1: Some("ja".to_string()),
                ..Default::default()
            },
            0,
        )
        .await
        .unwrap();
        assert_eq!(after_first.feedback_answer1.as_deref(), Some("ja"));

        let after_second = Submission::update_feedback(
            &db,
            submission.id,
            &FeedbackPatch {
                feedback_answer2: Some("nee".to_string()),
                ..Default::default()
            },
            after_first.feedback_version,
        )
        .await
        .unwrap();

        assert_eq!(after_second.feedback_answer1.as_deref(), Some("ja"));
        assert_eq!(after_second.feedback_answer2.as_deref(), Some("nee"));
        assert!(after_second.adjust_organism.is_none());
    }

    #[tokio::test]
    async fn generation_patch_is_monotonic() {
        let (db, workshop) = setup().await;
        let submission = Submission::create(&db, Uuid::new_v4(), workshop.id, None)
            .await
            .unwrap();

        let with_questions = Submission::update_generation(
            &db,
            submission.id,
            &GenerationPatch {
                feedback_question1: Some("Heeft het wortels?".to_string()),
                feedback_question2: Some("Groeit het snel?".to_string()),
                ..Default::default()
            },
            0,
        )
        .await
        .unwrap();
        assert!(with_questions.questions_ready().is_some());
        assert!(with_questions.image_ready().is_none());

        let with_image = Submission::update_generation(
            &db,
            submission.id,
            &GenerationPatch {
                ai_image_url: Some("https://example.org/organism.png".to_string()),
                ..Default::default()
            },
            with_questions.generation_version,
        )
        .await
        .unwrap();

        // earlier fields survive the later patch
        assert!(with_image.questions_ready().is_some());
        assert_eq!(
            with_image.image_ready().as_deref(),
            Some("https://example.org/organism.png")
        );
    }

    #[tokio::test]
    async fn find_latest_for_user_orders_newest_first() {
        let (db, workshop) = setup().await;
        let user_id = Uuid::new_v4();

        let first = Submission::create(&db, user_id, workshop.id, None)
            .await
            .unwrap();
        let second = Submission::create(
            &db,
            user_id,
            workshop.id,
            Some("/storage/original_uploads/prior.jpg".to_string()),
        )
        .await
        .unwrap();
        Submission::create(&db, Uuid::new_v4(), workshop.id, None)
            .await
            .unwrap();

        let history = Submission::find_latest_for_user(&db, user_id).await.unwrap();
        assert_eq!(history.len(), 2);
        assert_eq!(history[0].id, second.id);
        assert_eq!(history[1].id, first.id);
        assert_eq!(
            history[0].original_image_url.as_deref(),
            Some("/storage/original_uploads/prior.jpg")
        );
    }
}
