use sea_orm_migration::prelude::*;
use sea_orm_migration::sea_orm::DatabaseBackend;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .if_not_exists()
                    .table(Workshops::Table)
                    .col(pk_id_col(manager, Workshops::Id))
                    .col(uuid_col(Workshops::Uuid))
                    .col(ColumnDef::new(Workshops::Title).string().not_null())
                    .col(
                        ColumnDef::new(Workshops::AccessCode)
                            .string_len(64)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Workshops::Active)
                            .boolean()
                            .not_null()
                            .default(Expr::val(true)),
                    )
                    .col(
                        ColumnDef::new(Workshops::VideoSubmissionCount)
                            .integer()
                            .not_null()
                            .default(Expr::val(0)),
                    )
                    .col(ColumnDef::new(Workshops::VideoGeneratedAt).timestamp())
                    .col(timestamp_col(Workshops::CreatedAt))
                    .col(timestamp_col(Workshops::UpdatedAt))
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_workshops_uuid")
                    .table(Workshops::Table)
                    .col(Workshops::Uuid)
                    .unique()
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_workshops_access_code")
                    .table(Workshops::Table)
                    .col(Workshops::AccessCode)
                    .unique()
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .if_not_exists()
                    .table(Submissions::Table)
                    .col(pk_id_col(manager, Submissions::Id))
                    .col(uuid_col(Submissions::Uuid))
                    .col(uuid_col(Submissions::UserId))
                    .col(
                        ColumnDef::new(Submissions::WorkshopId)
                            .big_integer()
                            .not_null(),
                    )
                    .col(ColumnDef::new(Submissions::OrganismType).string())
                    .col(ColumnDef::new(Submissions::Color).string())
                    .col(ColumnDef::new(Submissions::Size).string())
                    .col(ColumnDef::new(Submissions::Quantity).string())
                    .col(ColumnDef::new(Submissions::Landscape).text())
                    .col(ColumnDef::new(Submissions::Features).text())
                    .col(ColumnDef::new(Submissions::OriginalImageUrl).string())
                    .col(version_col(Submissions::ProfileVersion))
                    .col(ColumnDef::new(Submissions::FeedbackAnswer1).string())
                    .col(ColumnDef::new(Submissions::FeedbackAnswer2).string())
                    .col(ColumnDef::new(Submissions::AdjustOrganism).boolean())
                    .col(version_col(Submissions::FeedbackVersion))
                    .col(ColumnDef::new(Submissions::AiDescription).text())
                    .col(ColumnDef::new(Submissions::FeedbackQuestion1).text())
                    .col(ColumnDef::new(Submissions::FeedbackQuestion2).text())
                    .col(ColumnDef::new(Submissions::AiPrompt).text())
                    .col(ColumnDef::new(Submissions::AiModelImageAnalysis).string())
                    .col(ColumnDef::new(Submissions::AiModelPromptGeneration).string())
                    .col(ColumnDef::new(Submissions::AiModelImageGeneration).string())
                    .col(ColumnDef::new(Submissions::AiImageRatio).string())
                    .col(ColumnDef::new(Submissions::AiImageUrl).string())
                    .col(ColumnDef::new(Submissions::Summary).text())
                    .col(ColumnDef::new(Submissions::LatinName).string())
                    .col(version_col(Submissions::GenerationVersion))
                    .col(timestamp_col(Submissions::CreatedAt))
                    .col(timestamp_col(Submissions::UpdatedAt))
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_submissions_workshop_id")
                            .from(Submissions::Table, Submissions::WorkshopId)
                            .to(Workshops::Table, Workshops::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_submissions_uuid")
                    .table(Submissions::Table)
                    .col(Submissions::Uuid)
                    .unique()
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_submissions_user_id")
                    .table(Submissions::Table)
                    .col(Submissions::UserId)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_submissions_workshop_id")
                    .table(Submissions::Table)
                    .col(Submissions::WorkshopId)
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .if_not_exists()
                    .table(WorkshopSessions::Table)
                    .col(pk_id_col(manager, WorkshopSessions::Id))
                    .col(uuid_col(WorkshopSessions::Uuid))
                    .col(uuid_col(WorkshopSessions::UserId))
                    .col(
                        ColumnDef::new(WorkshopSessions::WorkshopId)
                            .big_integer()
                            .not_null(),
                    )
                    .col(uuid_col(WorkshopSessions::SubmissionUuid))
                    .col(timestamp_col(WorkshopSessions::CreatedAt))
                    .col(
                        ColumnDef::new(WorkshopSessions::ExpiresAt)
                            .timestamp()
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_workshop_sessions_workshop_id")
                            .from(WorkshopSessions::Table, WorkshopSessions::WorkshopId)
                            .to(Workshops::Table, Workshops::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_workshop_sessions_uuid")
                    .table(WorkshopSessions::Table)
                    .col(WorkshopSessions::Uuid)
                    .unique()
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .if_not_exists()
                    .table(WebhookOutbox::Table)
                    .col(pk_id_col(manager, WebhookOutbox::Id))
                    .col(uuid_col(WebhookOutbox::Uuid))
                    .col(uuid_col(WebhookOutbox::SubmissionUuid))
                    .col(ColumnDef::new(WebhookOutbox::Payload).json().not_null())
                    .col(timestamp_col(WebhookOutbox::CreatedAt))
                    .col(ColumnDef::new(WebhookOutbox::DispatchedAt).timestamp())
                    .col(
                        ColumnDef::new(WebhookOutbox::Attempts)
                            .integer()
                            .not_null()
                            .default(Expr::val(0)),
                    )
                    .col(ColumnDef::new(WebhookOutbox::LastError).text())
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_webhook_outbox_dispatched_at")
                    .table(WebhookOutbox::Table)
                    .col(WebhookOutbox::DispatchedAt)
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .if_not_exists()
                    .table(Admins::Table)
                    .col(pk_id_col(manager, Admins::Id))
                    .col(uuid_col(Admins::Uuid))
                    .col(ColumnDef::new(Admins::Email).string().not_null())
                    .col(ColumnDef::new(Admins::PasswordHash).string().not_null())
                    .col(timestamp_col(Admins::CreatedAt))
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_admins_email")
                    .table(Admins::Table)
                    .col(Admins::Email)
                    .unique()
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .if_not_exists()
                    .table(GalleryItems::Table)
                    .col(pk_id_col(manager, GalleryItems::Id))
                    .col(uuid_col(GalleryItems::Uuid))
                    .col(ColumnDef::new(GalleryItems::Title).string().not_null())
                    .col(ColumnDef::new(GalleryItems::Description).text())
                    .col(ColumnDef::new(GalleryItems::ImageUrl).string().not_null())
                    .col(timestamp_col(GalleryItems::CreatedAt))
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_gallery_items_uuid")
                    .table(GalleryItems::Table)
                    .col(GalleryItems::Uuid)
                    .unique()
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(GalleryItems::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Admins::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(WebhookOutbox::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(WorkshopSessions::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Submissions::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Workshops::Table).to_owned())
            .await?;
        Ok(())
    }
}

fn pk_id_col<T: Iden>(manager: &SchemaManager, col: T) -> ColumnDef {
    let mut col = ColumnDef::new(col);
    match manager.get_database_backend() {
        DatabaseBackend::Sqlite => {
            col.integer();
        }
        _ => {
            col.big_integer();
        }
    }
    col.not_null().auto_increment().primary_key().to_owned()
}

fn uuid_col<T: Iden>(col: T) -> ColumnDef {
    ColumnDef::new(col).uuid().not_null().to_owned()
}

fn timestamp_col<T: Iden>(col: T) -> ColumnDef {
    ColumnDef::new(col)
        .timestamp()
        .not_null()
        .default(Expr::current_timestamp())
        .to_owned()
}

fn version_col<T: Iden>(col: T) -> ColumnDef {
    ColumnDef::new(col)
        .integer()
        .not_null()
        .default(Expr::val(0))
        .to_owned()
}

#[derive(Iden)]
enum Workshops {
    Table,
    Id,
    Uuid,
    Title,
    AccessCode,
    Active,
    VideoSubmissionCount,
    VideoGeneratedAt,
    CreatedAt,
    UpdatedAt,
}

#[derive(Iden)]
enum Submissions {
    Table,
    Id,
    Uuid,
    UserId,
    WorkshopId,
    OrganismType,
    Color,
    Size,
    Quantity,
    Landscape,
    Features,
    OriginalImageUrl,
    ProfileVersion,
    FeedbackAnswer1,
    FeedbackAnswer2,
    AdjustOrganism,
    FeedbackVersion,
    AiDescription,
    FeedbackQuestion1,
    FeedbackQuestion2,
    AiPrompt,
    AiModelImageAnalysis,
    AiModelPromptGeneration,
    AiModelImageGeneration,
    AiImageRatio,
    AiImageUrl,
    Summary,
    LatinName,
    GenerationVersion,
    CreatedAt,
    UpdatedAt,
}

#[derive(Iden)]
enum WorkshopSessions {
    Table,
    Id,
    Uuid,
    UserId,
    WorkshopId,
    SubmissionUuid,
    CreatedAt,
    ExpiresAt,
}

#[derive(Iden)]
enum WebhookOutbox {
    Table,
    Id,
    Uuid,
    SubmissionUuid,
    Payload,
    CreatedAt,
    DispatchedAt,
    Attempts,
    LastError,
}

#[derive(Iden)]
enum Admins {
    Table,
    Id,
    Uuid,
    Email,
    PasswordHash,
    CreatedAt,
}

#[derive(Iden)]
enum GalleryItems {
    Table,
    Id,
    Uuid,
    Title,
    Description,
    ImageUrl,
    CreatedAt,
}
