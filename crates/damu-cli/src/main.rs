use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};
use damu::client::ApiClient;
use damu::compat;
use damu::protocol::{
    AnalysisKind, BloodRequestSubmission, BloodType, DonationSubmission, DonationType, Inventory,
};
use serde::Serialize;
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(name = "damu", about = "damu blood donation CLI")]
struct Cli {
    /// Base URL of the damu API server.
    #[arg(long, global = true, env = "DAMU_API_URL", default_value = damu::DEFAULT_API_URL)]
    api_url: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Show blood bank stock per blood type.
    Inventory {
        /// Print raw JSON instead of a chart.
        #[arg(long)]
        json: bool,
    },
    /// List agent tasks.
    Tasks {
        /// Show the completed history instead of active tasks.
        #[arg(long)]
        completed: bool,
    },
    /// Schedule a donation and print a thank-you note.
    Donate {
        /// Donor's full name.
        name: String,
        /// Blood type, e.g. "O-".
        blood_type: BloodType,
        /// "center" or "pickup".
        #[arg(long, default_value = "center")]
        donation_type: DonationType,
        /// Donation center or pickup address.
        #[arg(long)]
        location: String,
    },
    /// Request blood for a hospital.
    Request {
        /// Requesting hospital.
        hospital: String,
        /// Blood type, e.g. "AB+".
        blood_type: BloodType,
        /// Units needed.
        units: u32,
        /// Reason for the request.
        #[arg(long)]
        reason: String,
    },
    /// Generate a thank-you note for a donor.
    ThankYou {
        /// Donor's name.
        name: String,
    },
    /// Analyze a delimited lab report (blood-work, platelet, white-cell).
    Analyze {
        /// Report kind.
        kind: AnalysisKind,
        /// Report file, or "-" for stdin.
        file: PathBuf,
    },
    /// Show donation compatibility for a blood type (offline).
    Compat {
        /// Blood type, e.g. "B+".
        blood_type: BloodType,
    },
    /// Show the blood product scarcity and demand index (offline).
    Scarcity,
    /// Health check.
    Health,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let client = ApiClient::new(cli.api_url);

    match cli.command {
        Command::Inventory { json } => {
            let inventory = client.inventory().await?;
            if json {
                print_json(&inventory)?;
            } else {
                for line in inventory_lines(&inventory) {
                    println!("{line}");
                }
            }
            Ok(())
        }
        Command::Tasks { completed } => {
            let tasks = if completed {
                client.completed_tasks().await?
            } else {
                client.active_tasks().await?
            };
            print_json(&tasks)
        }
        Command::Donate {
            name,
            blood_type,
            donation_type,
            location,
        } => {
            let submission = DonationSubmission {
                donor_name: name,
                blood_type,
                donation_type,
                location,
            };
            let ack = client.submit_donation(&submission).await?;
            println!("{}", ack.message);
            if let Some(task_id) = &ack.task_id {
                println!("Pickup task {task_id} created.");
            }
            println!();
            println!("{}", client.thank_you_note(&submission.donor_name).await);
            Ok(())
        }
        Command::Request {
            hospital,
            blood_type,
            units,
            reason,
        } => {
            let submission = BloodRequestSubmission {
                hospital_name: hospital,
                blood_type,
                units,
                reason,
            };
            let ack = client.submit_blood_request(&submission).await?;
            println!("{}", ack.message);
            if let Some(task_id) = &ack.task_id {
                println!("Delivery task {task_id} created.");
            }
            Ok(())
        }
        Command::ThankYou { name } => {
            println!("{}", client.thank_you_note(&name).await);
            Ok(())
        }
        Command::Analyze { kind, file } => {
            let content = read_report(&file)?;
            let report = client.analyze(kind, &content).await?;
            print_json(&report)
        }
        Command::Compat { blood_type } => print_json(&compat::profile(blood_type)),
        Command::Scarcity => {
            for entry in &compat::SCARCITY_INDEX {
                println!(
                    "{:<11}{:<27}{:<11}{}",
                    entry.component, entry.availability, entry.scarcity, entry.note
                );
            }
            Ok(())
        }
        Command::Health => {
            let health = client.health().await?;
            print_json(&health)?;
            if !health.healthy {
                bail!("server at {} is unhealthy", client.base_url());
            }
            Ok(())
        }
    }
}

/// Read a report from a file, or stdin when the path is `-`.
fn read_report(path: &Path) -> Result<String> {
    if path == Path::new("-") {
        std::io::read_to_string(std::io::stdin()).context("failed to read report from stdin")
    } else {
        std::fs::read_to_string(path)
            .with_context(|| format!("failed to read report: {}", path.display()))
    }
}

/// One bar per blood type with its population prevalence, then the total.
fn inventory_lines(inventory: &Inventory) -> Vec<String> {
    const WIDTH: u64 = 40;
    let max = inventory
        .entries()
        .iter()
        .map(|e| u64::from(e.units))
        .max()
        .unwrap_or(0)
        .max(1);
    let mut lines: Vec<String> = inventory
        .entries()
        .iter()
        .map(|entry| {
            let bar = (u64::from(entry.units) * WIDTH / max) as usize;
            format!(
                "{:<4}{:>5}  {:>3}% of donors  {}",
                entry.blood_type.as_str(),
                entry.units,
                entry.blood_type.prevalence_percent(),
                "#".repeat(bar)
            )
        })
        .collect();
    lines.push(format!("{:<4}{:>5}", "", inventory.total_units()));
    lines
}

fn print_json<T: Serialize>(data: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(data)?);
    Ok(())
}
