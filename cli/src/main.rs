//! Command line client for the gallery: batch uploads plus the feed, category
//! and photo management operations.

mod files;

use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use chrono::{DateTime, Utc};
use clap::{Parser, Subcommand};
use gallery_atoms::auth::{require_identity, CognitoIdentity};
use gallery_atoms::photos::{
    delete_photo, get_photo, list_owned_photos, list_photos, update_photo, FeedCursor,
    ListPhotosParams, UpdatePhotoPayload,
};
use gallery_atoms::uploads::{upload_batch, BatchMetadata, UploadContext, UploadProgress};
use gallery_shared::{logging, AppState};
use serde::Serialize;

#[derive(Parser)]
#[command(name = "gallery")]
#[command(about = "Upload and browse gallery photos")]
#[command(version)]
struct Cli {
    /// Cognito access token of the acting user
    #[arg(long, env = "COGNITO_ACCESS_TOKEN", hide_env_values = true, global = true)]
    token: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Upload one or more image files as a batch
    Upload {
        #[arg(required = true)]
        files: Vec<PathBuf>,
        /// Batch title; defaults to the first file name
        #[arg(long)]
        title: Option<String>,
        #[arg(long)]
        description: Option<String>,
        /// Category name, repeatable
        #[arg(long = "category")]
        categories: Vec<String>,
    },
    /// Public feed, newest first
    Feed {
        #[arg(long)]
        category: Option<String>,
        /// Only photos of this owner
        #[arg(long)]
        owner: Option<String>,
        /// RFC 3339 timestamp from a previous page
        #[arg(long)]
        cursor: Option<DateTime<Utc>>,
        #[arg(long, requires = "cursor")]
        cursor_id: Option<String>,
        #[arg(long)]
        limit: Option<usize>,
    },
    /// Every photo of the current user
    Mine,
    /// One photo with its categories
    Show { id: String },
    /// All categories in display order
    Categories,
    /// Create a category, or return the existing one with that name
    CategoryCreate {
        name: String,
        #[arg(long)]
        description: Option<String>,
    },
    /// Change title, description or visibility of an owned photo
    Update {
        id: String,
        #[arg(long)]
        title: Option<String>,
        #[arg(long)]
        description: Option<String>,
        #[arg(long, conflicts_with = "private")]
        public: bool,
        #[arg(long)]
        private: bool,
    },
    /// Delete an owned photo and its stored object
    Delete { id: String },
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn log_progress(progress: &UploadProgress) {
    tracing::info!(
        "[{:>5.1}%] {} ({}) {:?}",
        progress.percent,
        progress.file_name,
        progress.file_index + 1,
        progress.stage
    );
}

#[tokio::main]
async fn main() -> Result<()> {
    logging::init();

    let Cli { token, command } = Cli::parse();
    let state = AppState::from_env()
        .await
        .context("failed to load gallery configuration")?;
    let auth = CognitoIdentity::new(state.cognito_client.clone(), token);
    let store = state.store.as_ref();

    match command {
        Commands::Upload {
            files,
            title,
            description,
            categories,
        } => {
            let Some(title) = title.or_else(|| files::default_title(&files)) else {
                bail!("a title is required");
            };
            let category_ids = state.categories.resolve_all(&categories).await?;
            let local_files = files::load_files(&files).await?;

            let ctx = UploadContext {
                photos: store,
                objects: &state.objects,
                transfer: &state.transfer,
                auth: &auth,
                limits: state.config.upload_limits(),
            };
            let metadata = BatchMetadata {
                title,
                description,
                category_ids,
            };

            let report = upload_batch(&ctx, &local_files, &metadata, &log_progress).await?;
            print_json(&report)?;
            if !report.is_complete_success() {
                bail!(
                    "{} of {} files failed",
                    report.failures.len(),
                    local_files.len()
                );
            }
        }
        Commands::Feed {
            category,
            owner,
            cursor,
            cursor_id,
            limit,
        } => {
            let category_id = match category {
                Some(name) => Some(
                    state
                        .categories
                        .resolve(&name)
                        .await?
                        .with_context(|| format!("unknown category '{}'", name))?,
                ),
                None => None,
            };
            let params = ListPhotosParams {
                cursor: cursor.map(|created_at| FeedCursor {
                    created_at,
                    id: cursor_id,
                }),
                category_id,
                owner_id: owner,
                limit: limit.or(Some(state.config.page_size)),
            };
            print_json(&list_photos(store, params).await?)?;
        }
        Commands::Mine => {
            let identity = require_identity(&auth).await?;
            print_json(&list_owned_photos(store, &identity.id).await?)?;
        }
        Commands::Show { id } => match get_photo(store, store, &id).await? {
            Some(photo) => print_json(&photo)?,
            None => bail!("photo {} not found", id),
        },
        Commands::Categories => {
            print_json(&state.categories.list().await?)?;
        }
        Commands::CategoryCreate { name, description } => {
            print_json(&state.categories.create(&auth, &name, description).await?)?;
        }
        Commands::Update {
            id,
            title,
            description,
            public,
            private,
        } => {
            let is_public = match (public, private) {
                (true, _) => Some(true),
                (_, true) => Some(false),
                _ => None,
            };
            let payload = UpdatePhotoPayload {
                title,
                description,
                is_public,
            };
            print_json(&update_photo(store, &auth, &id, payload).await?)?;
        }
        Commands::Delete { id } => {
            delete_photo(store, &state.objects, &auth, &id).await?;
            tracing::info!("Deleted photo {}", id);
        }
    }

    Ok(())
}
