use anyhow::Context;
use clap::{Parser, Subcommand};
use lms_core::config::core_config_from_env_value;
use lms_core::constants::API_BASE_URL_ENV;
use lms_core::{
    plan_swap, ContentRenderer, CoreConfig, Direction, EntityId, EntityKind, InMemoryOrderStore,
    OrderStore, OrderedEntry, ReorderService, SiblingScope, SwapOutcome,
};
use std::io::Read;
use std::path::{Path, PathBuf};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "lms")]
#[command(about = "LMS lesson content and ordering tools")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Render lesson content (JSON document or plain text) to HTML
    Render {
        /// Content file; reads stdin when omitted or `-`
        file: Option<PathBuf>,
        /// API origin for root-relative image URLs (overrides LMS_API_BASE_URL)
        #[arg(long)]
        api_base_url: Option<String>,
    },
    /// Plan an up/down move within a sibling list without persisting it
    PlanSwap {
        /// JSON array of {"id", "order"} in display order; `-` for stdin
        siblings: PathBuf,
        /// Id of the entity to move
        target_id: String,
        /// `up` or `down`
        direction: String,
    },
    /// Move an entity up or down in an order store file
    Move {
        /// Order store snapshot file
        store: PathBuf,
        #[command(flatten)]
        scope: ScopeArgs,
        /// Id of the entity to move
        target_id: String,
        /// `up` or `down`
        direction: String,
    },
    /// Append a new entity to a scope in an order store file
    Add {
        /// Order store snapshot file (created if missing)
        store: PathBuf,
        #[command(flatten)]
        scope: ScopeArgs,
        /// Id of the new entity
        id: String,
    },
    /// Remove an entity from an order store file
    Remove {
        /// Order store snapshot file
        store: PathBuf,
        #[command(flatten)]
        scope: ScopeArgs,
        /// Id of the entity to remove
        id: String,
    },
    /// List a scope of an order store file in display order
    List {
        /// Order store snapshot file
        store: PathBuf,
        #[command(flatten)]
        scope: ScopeArgs,
    },
}

#[derive(clap::Args)]
struct ScopeArgs {
    /// Entity kind: category, course, module, submodule, lesson, quiz or exercise
    #[arg(long)]
    kind: String,
    /// Parent id (required for everything except categories)
    #[arg(long)]
    parent: Option<String>,
}

impl ScopeArgs {
    fn to_scope(&self) -> anyhow::Result<SiblingScope> {
        let kind: EntityKind = self.kind.parse()?;
        let parent = self.parent.as_deref().map(EntityId::new).transpose()?;
        Ok(SiblingScope::new(kind, parent)?)
    }
}

fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::from_default_env().add_directive("lms=info".parse()?))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();

    let output = match cli.command {
        Some(Commands::Render { file, api_base_url }) => {
            let cfg = match api_base_url {
                Some(url) => CoreConfig::new(Some(url))?,
                None => core_config_from_env_value(std::env::var(API_BASE_URL_ENV).ok())?,
            };
            let raw = read_input(file.as_deref())?;
            render(&cfg, &raw)
        }
        Some(Commands::PlanSwap {
            siblings,
            target_id,
            direction,
        }) => {
            let raw = read_input(Some(&siblings))?;
            plan(&raw, &target_id, &direction)?
        }
        Some(Commands::Move {
            store,
            scope,
            target_id,
            direction,
        }) => move_entity(&store, &scope.to_scope()?, &target_id, &direction)?,
        Some(Commands::Add { store, scope, id }) => add(&store, &scope.to_scope()?, &id)?,
        Some(Commands::Remove { store, scope, id }) => remove(&store, &scope.to_scope()?, &id)?,
        Some(Commands::List { store, scope }) => list(&store, &scope.to_scope()?)?,
        None => "Use 'lms --help' for commands".to_string(),
    };

    println!("{}", output);
    Ok(())
}

fn read_input(path: Option<&Path>) -> anyhow::Result<String> {
    match path {
        Some(p) if p != Path::new("-") => std::fs::read_to_string(p)
            .with_context(|| format!("failed to read {}", p.display())),
        _ => {
            let mut buf = String::new();
            std::io::stdin()
                .read_to_string(&mut buf)
                .context("failed to read stdin")?;
            Ok(buf)
        }
    }
}

fn render(cfg: &CoreConfig, raw: &str) -> String {
    let renderer = ContentRenderer::new(cfg);
    // Blank input is the same as a lesson with no content.
    let raw = raw.trim();
    renderer.render_str((!raw.is_empty()).then_some(raw))
}

fn plan(raw_siblings: &str, target_id: &str, direction: &str) -> anyhow::Result<String> {
    let siblings: Vec<OrderedEntry> =
        serde_json::from_str(raw_siblings).context("siblings must be a JSON array of {id, order}")?;
    let target_id = EntityId::new(target_id)?;
    let direction: Direction = direction.parse()?;

    describe(&plan_swap(&siblings, &target_id, direction))
}

fn describe(outcome: &SwapOutcome) -> anyhow::Result<String> {
    Ok(match outcome {
        SwapOutcome::Swap(plan) => serde_json::to_string(plan)?,
        SwapOutcome::NoOp(reason) => format!("no-op: {}", reason),
    })
}

fn move_entity(
    store_path: &Path,
    scope: &SiblingScope,
    target_id: &str,
    direction: &str,
) -> anyhow::Result<String> {
    let target_id = EntityId::new(target_id)?;
    let direction: Direction = direction.parse()?;

    let mut service = ReorderService::new(InMemoryOrderStore::load(store_path)?);
    let outcome = service.move_entity(scope, &target_id, direction)?;
    if !outcome.is_noop() {
        service.store().save(store_path)?;
        tracing::info!(store = %store_path.display(), %scope, id = %target_id, %direction, "Move persisted");
    }
    describe(&outcome)
}

fn add(store_path: &Path, scope: &SiblingScope, id: &str) -> anyhow::Result<String> {
    let mut store = if store_path.exists() {
        InMemoryOrderStore::load(store_path)?
    } else {
        InMemoryOrderStore::new()
    };
    let entry = store.insert(scope, EntityId::new(id)?)?;
    store.save(store_path)?;
    tracing::info!(store = %store_path.display(), %scope, id = %entry.id, order = entry.order, "Entity added");
    Ok(format!("Added {} with order {}", entry.id, entry.order))
}

fn remove(store_path: &Path, scope: &SiblingScope, id: &str) -> anyhow::Result<String> {
    let mut store = InMemoryOrderStore::load(store_path)?;
    let entry = store.remove(scope, &EntityId::new(id)?)?;
    store.save(store_path)?;
    tracing::info!(store = %store_path.display(), %scope, id = %entry.id, "Entity removed");
    Ok(format!("Removed {} (order {})", entry.id, entry.order))
}

fn list(store_path: &Path, scope: &SiblingScope) -> anyhow::Result<String> {
    let service = ReorderService::new(InMemoryOrderStore::load(store_path)?);
    let siblings = service.ordered_siblings(scope)?;
    if siblings.is_empty() {
        return Ok(format!("No {} found.", scope));
    }
    Ok(siblings
        .iter()
        .map(|e| format!("{}\t{}", e.order, e.id))
        .collect::<Vec<_>>()
        .join("\n"))
}
