//! AIMM — build, retrain and save mental models from the command line.

use std::path::{Path, PathBuf};

use aimm_client::EditorSession;
use aimm_core::AimmConfig;
use aimm_diagram::DiagramController;
use tracing::info;
use tracing_subscriber::EnvFilter;

mod plan;

use plan::ModelPlan;

fn resolve_config_path() -> PathBuf {
    std::env::var("AIMM_CONFIG")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from("aimm.json"))
}

fn print_help() {
    println!("AIMM — mental model editor");
    println!();
    println!("Usage: aimm <command>");
    println!();
    println!("Commands:");
    println!("  factors [term]           List factors, optionally filtered by name");
    println!("  models                   List saved models by level");
    println!("  save <plan.json>         Build a model from a plan and save it");
    println!("  retrain <plan.json>      Build a model from a plan and retrain it");
    println!("  show <model-name>        Print the graph of a saved model");
    println!("  init-config              Write the current configuration to disk");
    println!("  logout                   Forget the logged-in user");
    println!("  help                     Show this help message");
}

fn require_arg<'a>(args: &'a [String], usage: &str) -> &'a str {
    match args.get(2) {
        Some(a) => a,
        None => {
            eprintln!("Usage: aimm {}", usage);
            std::process::exit(1);
        }
    }
}

fn print_graph(ctl: &DiagramController) {
    let cells = ctl.store().get_cells();
    println!("Model: {}", ctl.model_name());
    println!("Target: {}", ctl.target().unwrap_or("-"));
    println!("Quality: {}", ctl.quality());
    for node in cells.nodes() {
        let marker = if node.is_target { " (target)" } else { "" };
        println!(
            "  {} {}{} at ({}, {})",
            node.id, node.label, marker, node.position.x, node.position.y
        );
    }
    for link in cells.links() {
        let from = cells.node(link.source_node()).map_or("?", |n| n.label.as_str());
        let to = cells.node(link.target_node()).map_or("?", |n| n.label.as_str());
        let weight = link
            .weight
            .map(|w| w.to_string())
            .unwrap_or_else(|| "-".into());
        let trainable = if link.trainable { " trainable" } else { "" };
        println!("  {} {} -> {} weight {}{}", link.id, from, to, weight, trainable);
    }
}

async fn session_with_plan(config: AimmConfig, path: &Path) -> anyhow::Result<EditorSession> {
    let plan = ModelPlan::load(path)?;
    let mut session = EditorSession::new(config)?;
    session.load_catalog().await;
    let catalog = session.catalog().clone();
    plan.apply(&catalog, session.controller_mut())?;
    Ok(session)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let args: Vec<String> = std::env::args().collect();
    let config_path = resolve_config_path();
    let config = AimmConfig::load(&config_path);
    info!("Backend: {}", config.api_url);

    let command = args.get(1).map(String::as_str).unwrap_or("help");
    match command {
        "factors" => {
            let mut session = EditorSession::new(config)?;
            session.load_catalog().await;
            let catalog = session.catalog();
            match args.get(2) {
                Some(term) => {
                    for f in catalog.search(term) {
                        println!("{}", f.name);
                    }
                }
                None => {
                    for t in &catalog.targets {
                        println!("{} [target]", t.name);
                    }
                    for f in &catalog.admin_factors {
                        println!("{} [admin]", f.name);
                    }
                    for f in &catalog.user_factors {
                        println!("{} [user]", f.name);
                    }
                }
            }
        }
        "models" => {
            let mut session = EditorSession::new(config)?;
            session.load_catalog().await;
            for level in &session.catalog().model_levels {
                println!("Level {}:", level.key);
                for m in &level.models {
                    println!(
                        "  {} (target: {}, quality: {}, {} links)",
                        m.name,
                        m.target_factor.as_deref().unwrap_or("-"),
                        m.quality,
                        m.links.len()
                    );
                }
            }
        }
        "save" => {
            let path = require_arg(&args, "save <plan.json>");
            let mut session = session_with_plan(config, Path::new(path)).await?;
            let response = session.save().await?;
            println!(
                "{}",
                response
                    .message
                    .unwrap_or_else(|| "Model saved successfully!".into())
            );
        }
        "retrain" => {
            let path = require_arg(&args, "retrain <plan.json>");
            let mut session = session_with_plan(config, Path::new(path)).await?;
            let quality = session.retrain().await?;
            println!("Quality: {}", quality);
        }
        "show" => {
            let name = require_arg(&args, "show <model-name>");
            let mut session = EditorSession::new(config)?;
            session.load_catalog().await;
            session.open_model(name)?;
            print_graph(session.controller());
        }
        "init-config" => {
            config.save()?;
            println!("Wrote {}", config_path.display());
        }
        "logout" => {
            let mut session = EditorSession::new(config)?;
            session.logout()?;
            println!("Logged out");
        }
        "--help" | "-h" | "help" => print_help(),
        other => {
            eprintln!("Unknown command: {}. Use 'aimm help' for usage.", other);
            std::process::exit(1);
        }
    }

    Ok(())
}
