//! FieldOps CLI - agent roster and mission status
//!
//! The `fieldops` command talks to the back-office API. Every command starts
//! from a fresh, reconciled agent directory; when the API is unreachable the
//! command works against whatever local data it has and mutations fall back
//! to local patches.
//!
//! ## Commands
//!
//! - `agents`: List agents (optionally by status)
//! - `summary`: Agent counts per status
//! - `update`: Patch agent fields
//! - `assign` / `detach`: Put an agent on, or take it off, a mission
//! - `remove`: Delete an agent
//! - `missions`: Missions grouped as running, upcoming, finished
//! - `end-mission`: Detach a mission's agents and mark it completed

use std::collections::BTreeMap;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use serde::Serialize;
use tracing::{info, warn, Level};

use fieldops_core::{
    init_tracing, AgentDirectory, LogFormat, Mission, MissionBoard, MissionGroups, SessionSpan,
    METRICS,
};
use fieldops_state::{
    Agent, AgentBackend, AgentId, AgentPatch, AgentStatus, BackendConfig, EventId, EventSource,
    HttpBackend,
};

#[derive(Parser)]
#[command(name = "fieldops")]
#[command(author = "FieldOps Engineering")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Agent roster and mission status for security operations", long_about = None)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Emit JSON-formatted log lines
    #[arg(long, global = true)]
    json: bool,

    /// Back-office API base URL
    #[arg(long, global = true, env = "FIELDOPS_API_URL")]
    api_url: Option<String>,

    /// Format of command results on stdout
    #[arg(short, long, global = true, value_enum, default_value_t = Output::Table)]
    output: Output,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Output {
    Table,
    Json,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// List agents, reconciled against running missions
    Agents {
        /// Only agents with this status (active, inactive, on_mission)
        #[arg(long)]
        status: Option<AgentStatus>,
    },

    /// Number of agents per status
    Summary,

    /// Update an agent's fields
    Update {
        /// Agent ID
        id: AgentId,

        #[arg(long)]
        name: Option<String>,

        /// New status (active, inactive, on_mission)
        #[arg(long)]
        status: Option<AgentStatus>,

        #[arg(long)]
        rank: Option<String>,

        #[arg(long)]
        specialization: Option<String>,

        #[arg(long)]
        phone: Option<String>,

        #[arg(long)]
        email: Option<String>,

        /// Set the current mission label
        #[arg(long, conflicts_with = "clear_mission")]
        mission: Option<String>,

        /// Clear the current mission label
        #[arg(long)]
        clear_mission: bool,
    },

    /// Assign an agent to a mission
    Assign {
        /// Agent ID
        agent: AgentId,

        /// Mission (calendar event) ID
        mission: EventId,
    },

    /// Take an agent off its mission
    Detach {
        /// Agent ID
        agent: AgentId,
    },

    /// Delete an agent
    Remove {
        /// Agent ID
        agent: AgentId,
    },

    /// List missions grouped by state
    Missions,

    /// Detach every agent of a mission and mark it completed
    EndMission {
        /// Mission (calendar event) ID
        mission: EventId,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    // Setup logging
    let level = if cli.verbose {
        Level::DEBUG
    } else {
        Level::INFO
    };
    let format = if cli.json {
        LogFormat::Json
    } else {
        LogFormat::from_env()
    };
    init_tracing(format, level);
    let _session = SessionSpan::enter();

    let mut config = BackendConfig::from_env();
    if let Some(url) = cli.api_url {
        config.base_url = url;
    }
    let backend = Arc::new(
        HttpBackend::new(config).context("Invalid back-office API configuration")?,
    );
    info!(api = %backend.config().base_url, "using back-office API");

    let mut directory = AgentDirectory::new(backend.clone(), backend.clone());
    let mut board = MissionBoard::new(backend);

    let result = run(cli.command, cli.output, &mut directory, &mut board).await;
    if cli.verbose {
        METRICS.flush();
    }
    result
}

async fn run<B, S, E>(
    command: Commands,
    output: Output,
    directory: &mut AgentDirectory<B, S>,
    board: &mut MissionBoard<E>,
) -> Result<()>
where
    B: AgentBackend,
    S: EventSource,
    E: EventSource,
{
    if !directory.refresh().await {
        warn!(
            "API unavailable, working from local data: {}",
            directory.last_error().unwrap_or("unknown error")
        );
    }

    match command {
        Commands::Agents { status } => cmd_agents(directory, status, output),
        Commands::Summary => cmd_summary(directory, output),
        Commands::Update {
            id,
            name,
            status,
            rank,
            specialization,
            phone,
            email,
            mission,
            clear_mission,
        } => {
            let current_mission = if clear_mission {
                Some(None)
            } else {
                mission.map(Some)
            };
            let patch = AgentPatch {
                name,
                status,
                current_mission,
                rank,
                specialization,
                phone,
                email,
            };
            cmd_update(directory, id, &patch, output).await
        }
        Commands::Assign { agent, mission } => {
            cmd_assign(directory, agent, mission, output).await
        }
        Commands::Detach { agent } => cmd_detach(directory, agent, output).await,
        Commands::Remove { agent } => cmd_remove(directory, agent).await,
        Commands::Missions => cmd_missions(directory, board, output).await,
        Commands::EndMission { mission } => {
            cmd_end_mission(directory, board, mission, output).await
        }
    }
}

fn cmd_agents<B, S>(
    directory: &AgentDirectory<B, S>,
    status: Option<AgentStatus>,
    output: Output,
) -> Result<()>
where
    B: AgentBackend,
    S: EventSource,
{
    let agents: Vec<&Agent> = directory
        .agents()
        .iter()
        .filter(|a| status.map_or(true, |s| a.status == s))
        .collect();

    emit(output, &agents, || {
        if agents.is_empty() {
            "No agents found\n".to_string()
        } else {
            render_agents(&agents)
        }
    })
}

#[derive(Serialize)]
struct Summary {
    total: usize,
    by_status: BTreeMap<AgentStatus, usize>,
}

fn cmd_summary<B, S>(directory: &AgentDirectory<B, S>, output: Output) -> Result<()>
where
    B: AgentBackend,
    S: EventSource,
{
    let summary = Summary {
        total: directory.agents().len(),
        by_status: directory.count_by_status(),
    };

    emit(output, &summary, || {
        let mut out = format!("Agents: {}\n", summary.total);
        for status in [
            AgentStatus::Active,
            AgentStatus::OnMission,
            AgentStatus::Inactive,
        ] {
            let count = summary.by_status.get(&status).copied().unwrap_or(0);
            out.push_str(&format!("  {:<12} {}\n", status.as_str(), count));
        }
        out
    })
}

async fn cmd_update<B, S>(
    directory: &mut AgentDirectory<B, S>,
    id: AgentId,
    patch: &AgentPatch,
    output: Output,
) -> Result<()>
where
    B: AgentBackend,
    S: EventSource,
{
    if patch.is_empty() {
        anyhow::bail!("Nothing to update; pass at least one field");
    }

    let agent = directory
        .update_agent(id, patch)
        .await
        .with_context(|| format!("Agent {} not found", id))?;
    emit(output, agent, || render_agents(&[agent]))
}

async fn cmd_assign<B, S>(
    directory: &mut AgentDirectory<B, S>,
    agent_id: AgentId,
    mission_id: EventId,
    output: Output,
) -> Result<()>
where
    B: AgentBackend,
    S: EventSource,
{
    let agent = directory
        .assign_to_mission(agent_id, mission_id)
        .await?
        .with_context(|| format!("Agent {} not found", agent_id))?;
    emit(output, agent, || render_agents(&[agent]))
}

async fn cmd_detach<B, S>(
    directory: &mut AgentDirectory<B, S>,
    agent_id: AgentId,
    output: Output,
) -> Result<()>
where
    B: AgentBackend,
    S: EventSource,
{
    let agent = directory
        .detach_from_mission(agent_id)
        .await
        .with_context(|| format!("Agent {} not found", agent_id))?;
    emit(output, agent, || render_agents(&[agent]))
}

async fn cmd_remove<B, S>(directory: &mut AgentDirectory<B, S>, agent_id: AgentId) -> Result<()>
where
    B: AgentBackend,
    S: EventSource,
{
    if directory.remove_agent(agent_id).await {
        println!("Removed agent {}", agent_id);
    } else {
        println!("Agent {} was not in the roster", agent_id);
    }
    Ok(())
}

async fn cmd_missions<B, S, E>(
    directory: &mut AgentDirectory<B, S>,
    board: &mut MissionBoard<E>,
    output: Output,
) -> Result<()>
where
    B: AgentBackend,
    S: EventSource,
    E: EventSource,
{
    if !board.load(directory).await {
        warn!("{}", board.error().unwrap_or("Could not load missions"));
    }

    let groups = board.groups();
    emit(output, &groups, || render_missions(&groups))
}

async fn cmd_end_mission<B, S, E>(
    directory: &mut AgentDirectory<B, S>,
    board: &mut MissionBoard<E>,
    mission_id: EventId,
    output: Output,
) -> Result<()>
where
    B: AgentBackend,
    S: EventSource,
    E: EventSource,
{
    if !board.load(directory).await {
        warn!("{}", board.error().unwrap_or("Could not load missions"));
    }

    let mission = board.end_mission(mission_id, directory).await?;
    emit(output, mission, || {
        format!("Mission {} ({}) completed\n", mission.id, mission.title)
    })
}

/// Print `value` as pretty JSON, or the table produced by `table`.
fn emit<T: Serialize + ?Sized>(
    output: Output,
    value: &T,
    table: impl FnOnce() -> String,
) -> Result<()> {
    match output {
        Output::Json => println!("{}", serde_json::to_string_pretty(value)?),
        Output::Table => print!("{}", table()),
    }
    Ok(())
}

fn render_agents(agents: &[&Agent]) -> String {
    let mut out = format!(
        "{:<6} {:<24} {:<11} {}\n",
        "ID", "NAME", "STATUS", "MISSION"
    );
    for agent in agents {
        out.push_str(&format!(
            "{:<6} {:<24} {:<11} {}\n",
            agent.id,
            truncate(&agent.name, 24),
            agent.status.as_str(),
            agent.current_mission.as_deref().unwrap_or("-"),
        ));
    }
    out
}

fn render_missions(groups: &MissionGroups<'_>) -> String {
    let mut out = String::new();
    for (heading, missions) in [
        ("Running", &groups.running),
        ("Upcoming", &groups.upcoming),
        ("Finished", &groups.finished),
    ] {
        out.push_str(&format!("{} ({})\n", heading, missions.len()));
        for mission in missions.iter() {
            out.push_str(&render_mission_line(mission));
        }
    }
    out
}

fn render_mission_line(mission: &Mission) -> String {
    let agents = if mission.agent_ids.is_empty() {
        "-".to_string()
    } else {
        mission
            .agent_ids
            .iter()
            .map(|id| id.to_string())
            .collect::<Vec<_>>()
            .join(",")
    };
    let start = mission
        .start
        .map(|t| t.format("%Y-%m-%d %H:%M").to_string())
        .unwrap_or_else(|| "-".to_string());

    format!(
        "  #{:<5} {:<28} {:<12} {:<16} agents: {}\n",
        mission.id,
        truncate(&mission.title, 28),
        mission.status.as_str(),
        start,
        agents
    )
}

fn truncate(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let cut: String = s.chars().take(max_len.saturating_sub(1)).collect();
        format!("{}…", cut)
    }
}
