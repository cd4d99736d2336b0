//! Initial migration to create the gleaner database schema.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        self.create_found_repositories(manager).await?;
        self.create_filtered_repositories(manager).await?;
        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(FilteredRepositories::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(FoundRepositories::Table).to_owned())
            .await?;
        Ok(())
    }
}

impl Migration {
    async fn create_found_repositories(&self, manager: &SchemaManager<'_>) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(FoundRepositories::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(FoundRepositories::Key)
                            .string()
                            .not_null()
                            .primary_key(),
                    )
                    // Naming
                    .col(ColumnDef::new(FoundRepositories::Owner).string().not_null())
                    .col(ColumnDef::new(FoundRepositories::Name).string().not_null())
                    .col(ColumnDef::new(FoundRepositories::Url).text().not_null())
                    // Content
                    .col(ColumnDef::new(FoundRepositories::Description).text().null())
                    .col(ColumnDef::new(FoundRepositories::Homepage).text().null())
                    .col(
                        ColumnDef::new(FoundRepositories::Topics)
                            .json()
                            .not_null()
                            .default(Expr::cust("'[]'")),
                    )
                    .col(ColumnDef::new(FoundRepositories::Parent).string().null())
                    // Statistics
                    .col(count_column(FoundRepositories::Stars))
                    .col(count_column(FoundRepositories::Watchers))
                    .col(count_column(FoundRepositories::Forks))
                    .col(count_column(FoundRepositories::OpenIssues))
                    .col(count_column(FoundRepositories::ClosedIssues))
                    .col(count_column(FoundRepositories::OpenPulls))
                    .col(count_column(FoundRepositories::ClosedPulls))
                    .col(count_column(FoundRepositories::Releases))
                    .col(count_column(FoundRepositories::Contributors))
                    // Activity
                    .col(
                        ColumnDef::new(FoundRepositories::CreatedAt)
                            .timestamp_with_time_zone()
                            .null(),
                    )
                    .col(
                        ColumnDef::new(FoundRepositories::UpdatedAt)
                            .timestamp_with_time_zone()
                            .null(),
                    )
                    .col(
                        ColumnDef::new(FoundRepositories::LastCommitAt)
                            .timestamp_with_time_zone()
                            .null(),
                    )
                    .col(
                        ColumnDef::new(FoundRepositories::LatestReleaseName)
                            .string()
                            .null(),
                    )
                    .col(
                        ColumnDef::new(FoundRepositories::LatestReleaseTag)
                            .string()
                            .null(),
                    )
                    .col(
                        ColumnDef::new(FoundRepositories::LatestReleaseAt)
                            .timestamp_with_time_zone()
                            .null(),
                    )
                    // Languages
                    .col(
                        ColumnDef::new(FoundRepositories::PrimaryLanguage)
                            .string()
                            .null(),
                    )
                    .col(
                        ColumnDef::new(FoundRepositories::Languages)
                            .json()
                            .not_null()
                            .default(Expr::cust("'[]'")),
                    )
                    .col(count_column(FoundRepositories::TargetLanguageBytes))
                    .col(
                        ColumnDef::new(FoundRepositories::IsTargetLanguage)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    // Relevance
                    .col(
                        ColumnDef::new(FoundRepositories::Probe)
                            .json()
                            .not_null()
                            .default(Expr::cust("'{}'")),
                    )
                    .col(ColumnDef::new(FoundRepositories::ReadmeFile).string().null())
                    .col(
                        ColumnDef::new(FoundRepositories::ReadmeMentionsKeyword)
                            .boolean()
                            .null(),
                    )
                    // Tracking
                    .col(
                        ColumnDef::new(FoundRepositories::RecordedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .to_owned(),
            )
            .await?;

        // The export reads by star count
        manager
            .create_index(
                Index::create()
                    .name("idx_found_repos_stars")
                    .table(FoundRepositories::Table)
                    .col(FoundRepositories::Stars)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn create_filtered_repositories(
        &self,
        manager: &SchemaManager<'_>,
    ) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(FilteredRepositories::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(FilteredRepositories::Key)
                            .string()
                            .not_null()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(FilteredRepositories::Owner)
                            .string()
                            .not_null(),
                    )
                    .col(ColumnDef::new(FilteredRepositories::Name).string().not_null())
                    .col(
                        ColumnDef::new(FilteredRepositories::Exists)
                            .boolean()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(FilteredRepositories::Reason)
                            .string()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(FilteredRepositories::RecordedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_filtered_repos_reason")
                    .table(FilteredRepositories::Table)
                    .col(FilteredRepositories::Reason)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }
}

fn count_column(column: FoundRepositories) -> ColumnDef {
    ColumnDef::new(column)
        .big_integer()
        .not_null()
        .default(0)
        .to_owned()
}

#[derive(DeriveIden)]
#[sea_orm(iden = "found_repositories")]
enum FoundRepositories {
    Table,
    Key,
    Owner,
    Name,
    Url,
    Description,
    Homepage,
    Topics,
    Parent,
    Stars,
    Watchers,
    Forks,
    OpenIssues,
    ClosedIssues,
    OpenPulls,
    ClosedPulls,
    Releases,
    Contributors,
    CreatedAt,
    UpdatedAt,
    LastCommitAt,
    LatestReleaseName,
    LatestReleaseTag,
    LatestReleaseAt,
    PrimaryLanguage,
    Languages,
    TargetLanguageBytes,
    IsTargetLanguage,
    Probe,
    ReadmeFile,
    ReadmeMentionsKeyword,
    RecordedAt,
}

#[derive(DeriveIden)]
#[sea_orm(iden = "filtered_repositories")]
enum FilteredRepositories {
    Table,
    Key,
    Owner,
    Name,
    Exists,
    Reason,
    RecordedAt,
}
