use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "submissions")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    pub uuid: Uuid,
    pub user_id: Uuid,
    pub workshop_id: i64,
    // profile sub-document, owned by the participant, written once
    pub organism_type: Option<String>,
    pub color: Option<String>,
    pub size: Option<String>,
    pub quantity: Option<String>,
    pub landscape: Option<String>,
    pub features: Option<String>,
    pub original_image_url: Option<String>,
    pub profile_version: i32,
    // feedback sub-document, owned by the participant
    pub feedback_answer1: Option<String>,
    pub feedback_answer2: Option<String>,
    pub adjust_organism: Option<bool>,
    pub feedback_version: i32,
    // generation sub-document, owned by the external workflow
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
    pub created_at: DateTimeUtc,
    pub updated_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
