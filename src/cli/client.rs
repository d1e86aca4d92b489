//! Client CLI commands

use anyhow::Result;
use clap::Subcommand;
use serde_json::Value;

use super::output::Output;
use crate::domain::{Client, ClientStatus};
use crate::handler::{self, HandlerError};
use crate::storage::Project;

#[derive(Subcommand)]
pub enum ClientCommands {
    /// Add a client to a lane
    ///
    /// Examples:
    ///   lanes client add "Acme"                       # End of the default lane
    ///   lanes client add "Acme" --status in-progress  # End of another lane
    ///   lanes client add "Acme" --priority 1          # Top of the default lane
    Add {
        /// Client name
        name: String,

        /// Free-form description
        #[arg(long, short)]
        description: Option<String>,

        /// Lane to add to (backlog, in-progress, complete)
        #[arg(long, short)]
        status: Option<ClientStatus>,

        /// Rank within the lane (clamped to the lane bounds)
        #[arg(long, short, allow_hyphen_values = true)]
        priority: Option<String>,
    },

    /// List clients, optionally for one lane
    List {
        /// Only show this lane
        #[arg(long, short)]
        status: Option<ClientStatus>,
    },

    /// Show client details
    Show {
        /// Client ID
        id: String,
    },

    /// Move a client to another lane and/or rank
    ///
    /// Priorities outside the lane are clamped: anything below 1 goes to the
    /// top, anything past the end goes to the end.
    Move {
        /// Client ID
        id: String,

        /// New lane (backlog, in-progress, complete)
        #[arg(long, short)]
        status: Option<String>,

        /// New rank within the lane
        #[arg(long, short, allow_hyphen_values = true)]
        priority: Option<String>,
    },

    /// Edit a client's name or description
    Edit {
        /// Client ID
        id: String,

        /// New name
        #[arg(long, short)]
        name: Option<String>,

        /// New description
        #[arg(long, short)]
        description: Option<String>,
    },

    /// Remove a client
    Rm {
        /// Client ID
        id: String,
    },
}

pub fn run(cmd: ClientCommands, output: &Output) -> Result<()> {
    match cmd {
        ClientCommands::Add {
            name,
            description,
            status,
            priority,
        } => add_client(output, &name, description.as_deref(), status, priority),
        ClientCommands::List { status } => list_clients(output, status),
        ClientCommands::Show { id } => show_client(output, &id),
        ClientCommands::Move {
            id,
            status,
            priority,
        } => move_client(output, &id, status, priority),
        ClientCommands::Edit {
            id,
            name,
            description,
        } => edit_client(output, &id, name.as_deref(), description.as_deref()),
        ClientCommands::Rm { id } => remove_client(output, &id),
    }
}

/// Reports validation errors in the output format before failing
fn checked<T>(output: &Output, result: Result<T, HandlerError>) -> Result<T> {
    result.map_err(|err| match err {
        HandlerError::Validation(e) => {
            output.validation_error(&e);
            e.into()
        }
        HandlerError::Store(e) => e,
    })
}

fn add_client(
    output: &Output,
    name: &str,
    description: Option<&str>,
    status: Option<ClientStatus>,
    priority: Option<String>,
) -> Result<()> {
    let project = Project::open_current()?;
    let mut store = project.store()?;

    let status = status.unwrap_or(project.config().project.default_status);
    let priority = priority.map(Value::String);
    output.verbose_ctx(
        "add",
        &format!("Adding '{}' to {} at {:?}", name, status, priority),
    );

    let client = checked(
        output,
        handler::add_client(&mut store, name, description, status, priority.as_ref()),
    )?;

    if output.is_json() {
        output.data(&client);
    } else {
        output.success(&format!(
            "Created client: {} - {} ({} #{})",
            client.id, client.name, client.status, client.priority
        ));
    }

    Ok(())
}

fn list_clients(output: &Output, status: Option<ClientStatus>) -> Result<()> {
    let project = Project::open_current()?;
    let store = project.store()?;

    let clients = match status {
        Some(status) => store.lane(status)?,
        None => handler::board_order(store.read_all()?),
    };

    if output.is_json() {
        output.data(&clients);
    } else if clients.is_empty() {
        match status {
            Some(status) => println!("No clients in {}", status),
            None => println!("No clients"),
        }
    } else {
        print_table(&clients);
    }

    Ok(())
}

fn show_client(output: &Output, id: &str) -> Result<()> {
    let project = Project::open_current()?;
    let store = project.store()?;

    let client = checked(output, handler::show_client(&store, id))?;

    if output.is_json() {
        output.data(&client);
    } else {
        println!("ID:          {}", client.id);
        println!("Name:        {}", client.name);
        println!("Status:      {}", client.status);
        println!("Priority:    {}", client.priority);
        println!("Created:     {}", client.created_at.format("%Y-%m-%d %H:%M"));
        println!("Updated:     {}", client.updated_at.format("%Y-%m-%d %H:%M"));

        if let Some(ref desc) = client.description {
            println!();
            println!("{}", desc);
        }
    }

    Ok(())
}

fn move_client(
    output: &Output,
    id: &str,
    status: Option<String>,
    priority: Option<String>,
) -> Result<()> {
    let project = Project::open_current()?;
    let mut store = project.store()?;

    let status = status.map(Value::String);
    let priority = priority.map(Value::String);
    output.verbose_ctx(
        "move",
        &format!("Moving {} status={:?} priority={:?}", id, status, priority),
    );

    let outcome = checked(
        output,
        handler::move_client(&mut store, id, status.as_ref(), priority.as_ref()),
    )?;
    output.verbose_ctx(
        "move",
        &format!("{} client(s) changed position", outcome.changed.len()),
    );

    if output.is_json() {
        output.data(&outcome.clients);
    } else {
        let target = handler::parse_id(id).ok();
        match outcome.clients.iter().find(|c| Some(c.id) == target) {
            Some(client) if !outcome.changed.is_empty() => output.success(&format!(
                "Moved client {} to {} #{}",
                client.id, client.status, client.priority
            )),
            _ => output.success("Nothing to move"),
        }
        print_table(&outcome.clients);
    }

    Ok(())
}

fn edit_client(
    output: &Output,
    id: &str,
    name: Option<&str>,
    description: Option<&str>,
) -> Result<()> {
    let project = Project::open_current()?;
    let store = project.store()?;

    let client = checked(output, handler::show_client(&store, id))?;
    let client = store.update_details(client.id, name, description)?;

    if output.is_json() {
        output.data(&client);
    } else {
        output.success(&format!("Updated client: {} - {}", client.id, client.name));
    }

    Ok(())
}

fn remove_client(output: &Output, id: &str) -> Result<()> {
    let project = Project::open_current()?;
    let mut store = project.store()?;

    let removed = checked(output, handler::remove_client(&mut store, id))?;

    if output.is_json() {
        output.data(&removed);
    } else {
        output.success(&format!("Removed client: {} - {}", removed.id, removed.name));
    }

    Ok(())
}

fn print_table(clients: &[Client]) {
    println!("{:<6} {:<12} {:<9} NAME", "ID", "STATUS", "PRIORITY");
    println!("{}", "-".repeat(60));

    for client in clients {
        println!(
            "{:<6} {:<12} {:<9} {}",
            client.id.get(),
            client.status.as_str(),
            client.priority,
            client.name
        );
    }
}
