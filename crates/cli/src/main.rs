//! Command-line entry point for the Forge storyboard tool.
//!
//! Configuration comes from the environment (a `.env` file is honored):
//!
//! - `FORGE_DATA_DIR`   - session store directory (default `.forge-data`)
//! - `FORGE_BRIDGE_URL` - Ollama bridge base URL
//! - `FORGE_SD_URL`     - diffusion backend base URL

use std::path::PathBuf;

use anyhow::{bail, Context};
use clap::{Parser, Subcommand};
use forge_bridge::{DiffusionApi, OllamaBridge};
use forge_session::{Orchestrator, ProjectSession, SessionStore};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "forge")]
#[command(about = "Forge storyboard tool - chat-log import, scripting, and illustration")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the project summary
    Show,

    /// Render the director's script
    Script {
        /// Write to a file instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Import a chat-log export as scenes
    ImportLog {
        /// Chat-log JSON file
        file: PathBuf,
    },

    /// Import a character card into the cast
    ImportCard {
        /// Character card JSON file
        file: PathBuf,
    },

    /// Save the project document
    Export {
        /// Output path (.forge)
        file: PathBuf,
    },

    /// Load a project document
    Load {
        /// Project document path (.forge)
        file: PathBuf,
    },

    /// Append a blank scene
    AddScene,

    /// Delete a scene by id
    DeleteScene {
        /// Scene id
        id: i64,
    },

    /// Check diffusion backend connectivity
    Probe,

    /// Rewrite a scene via the story engine
    Rewrite {
        /// Scene position, starting at 1
        scene: usize,
    },

    /// Generate an illustration for a scene
    Illustrate {
        /// Scene position, starting at 1
        scene: usize,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "forge=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cli = Cli::parse();

    let data_dir = std::env::var("FORGE_DATA_DIR").unwrap_or_else(|_| ".forge-data".into());
    let bridge_url = std::env::var("FORGE_BRIDGE_URL")
        .unwrap_or_else(|_| forge_bridge::ollama_bridge::DEFAULT_BRIDGE_URL.into());
    let sd_url = std::env::var("FORGE_SD_URL")
        .unwrap_or_else(|_| forge_bridge::diffusion::DEFAULT_DIFFUSION_URL.into());

    let mut session = ProjectSession::open(SessionStore::new(&data_dir));
    let mut orchestrator =
        Orchestrator::new(OllamaBridge::new(bridge_url), DiffusionApi::new(sd_url));

    match cli.command {
        Commands::Show => show(&session),
        Commands::Script { output } => {
            let script = session.render_script();
            match output {
                Some(path) => {
                    std::fs::write(&path, script)
                        .with_context(|| format!("writing script to {}", path.display()))?;
                    println!("Script written to {}", path.display());
                }
                None => println!("{script}"),
            }
        }
        Commands::ImportLog { file } => {
            let raw = std::fs::read_to_string(&file)
                .with_context(|| format!("reading chat log {}", file.display()))?;
            let source = file
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_else(|| file.display().to_string());
            let count = session.import_chat_log(&raw, &source)?;
            println!("Imported {count} scene(s) from {source}");
        }
        Commands::ImportCard { file } => {
            let raw = std::fs::read_to_string(&file)
                .with_context(|| format!("reading character card {}", file.display()))?;
            let name = orchestrator.import_character_card(&mut session, &raw).await?;
            println!("Imported character: {name}");
        }
        Commands::Export { file } => {
            let document = session.export_project()?;
            std::fs::write(&file, document)
                .with_context(|| format!("writing project to {}", file.display()))?;
            println!("Project saved to {}", file.display());
        }
        Commands::Load { file } => {
            let raw = std::fs::read_to_string(&file)
                .with_context(|| format!("reading project {}", file.display()))?;
            session.import_project(&raw)?;
            println!("Loaded: {}", session.project().title);
        }
        Commands::AddScene => {
            let id = session.add_scene()?;
            println!("Added scene {id}");
        }
        Commands::DeleteScene { id } => {
            session.delete_scene(id)?;
            println!("Deleted scene {id}");
        }
        Commands::Probe => {
            let status = orchestrator.probe_diffusion().await;
            println!("{status}");
        }
        Commands::Rewrite { scene } => {
            select_scene(&mut session, scene)?;
            orchestrator.rewrite_scene(&mut session).await?;
            println!("Scene {} rewritten", session.active_scene().id);
        }
        Commands::Illustrate { scene } => {
            select_scene(&mut session, scene)?;
            orchestrator.illustrate_scene(&mut session).await?;
            println!("Scene {} illustrated", session.active_scene().id);
        }
    }

    Ok(())
}

fn show(session: &ProjectSession) {
    let project = session.project();
    println!("{}", project.title);
    println!(
        "{} scene(s), {} cast member(s)",
        project.scenes.len(),
        project.cast.len()
    );
    for scene in &project.scenes {
        let preview: String = scene.text.chars().take(60).collect();
        let approved = if scene.approved { "approved" } else { "draft" };
        let illustrated = if scene.image_url.is_some() { ", illustrated" } else { "" };
        println!("  [{}] ({approved}{illustrated}) {} - {preview}", scene.id, scene.mood);
    }
    for member in &project.cast {
        println!("  cast: {} ({})", member.name, member.role);
    }
}

/// Point the session's cursor at a 1-based scene position.
fn select_scene(session: &mut ProjectSession, position: usize) -> anyhow::Result<()> {
    if position == 0 {
        bail!("scene numbers start at 1");
    }
    session.set_active_scene(position - 1)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn command_surface_is_well_formed() {
        Cli::command().debug_assert();
    }

    #[test]
    fn parses_scene_positions_and_paths() {
        let cli = Cli::try_parse_from(["forge", "rewrite", "2"]).unwrap();
        assert!(matches!(cli.command, Commands::Rewrite { scene: 2 }));

        let cli = Cli::try_parse_from(["forge", "import-log", "chat.json"]).unwrap();
        assert!(matches!(cli.command, Commands::ImportLog { .. }));
    }

    #[test]
    fn missing_subcommand_is_an_error() {
        assert!(Cli::try_parse_from(["forge"]).is_err());
    }
}
