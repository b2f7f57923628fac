use std::io::Write;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{anyhow, bail, Context};
use colored::Colorize;
use serde_json::{json, Map, Value};
use tracing::debug;

use nest_store::{Session, StoreConfig};
use nest_types::{validate_name, Node, NodeKind, Path};

use crate::cli::*;
use crate::values;

const LOCKED_MESSAGE: &str =
    "Database file is locked. Is the database in use by another application?";

const PREVIEW_WIDTH: usize = 60;

pub fn run_command(cli: Cli) -> anyhow::Result<()> {
    let mut session = open_session(&cli)?;
    let format = cli.format;
    match cli.command {
        Command::Tree(args) => cmd_tree(&session, args, format),
        Command::Get(args) => cmd_get(&mut session, args, format),
        Command::Mkbucket(args) => cmd_mkbucket(&mut session, args, format),
        Command::Put(args) => cmd_put(&mut session, args, format),
        Command::Update(args) => cmd_update(&mut session, args, format),
        Command::Rm(args) => cmd_rm(&mut session, args, format),
        Command::Empty(args) => cmd_empty(&mut session, args, format),
        Command::Rename(args) => cmd_rename(&mut session, args, format),
        Command::Cp(args) => cmd_transfer(&mut session, args, format, false),
        Command::Mv(args) => cmd_transfer(&mut session, args, format, true),
    }
}

fn open_session(cli: &Cli) -> anyhow::Result<Session> {
    let mut config = match &cli.config {
        Some(path) => StoreConfig::load(path)
            .with_context(|| format!("loading config {}", path.display()))?,
        None => StoreConfig::default(),
    };
    if let Some(ms) = cli.timeout_ms {
        config = config.with_open_timeout(Duration::from_millis(ms));
    }

    match Session::open(&cli.db, config) {
        Ok(session) => {
            debug!(
                db = %cli.db.display(),
                entries = session.snapshot().index().len(),
                "session ready"
            );
            Ok(session)
        }
        Err(e) if e.is_busy() => bail!(LOCKED_MESSAGE),
        Err(e) => Err(e).with_context(|| format!("opening {}", cli.db.display())),
    }
}

fn parse_path(s: &str) -> anyhow::Result<Path> {
    Path::parse(s).with_context(|| format!("invalid path {s:?}"))
}

/// Every segment of a path that may be created must be a valid name.
fn parse_new_path(s: &str) -> anyhow::Result<Path> {
    for segment in s.split('/') {
        validate_name(segment).with_context(|| format!("invalid path {s:?}"))?;
    }
    parse_path(s)
}

fn lookup(session: &Session, s: &str) -> anyhow::Result<Arc<Node>> {
    let path = parse_path(s)?;
    session
        .node(&path.to_key_string())
        .cloned()
        .ok_or_else(|| anyhow!("no bucket or key at {s}"))
}

fn encode_value(value: String, raw: bool) -> Vec<u8> {
    if raw {
        value.into_bytes()
    } else {
        values::compact_json(value.as_bytes())
    }
}

fn report(format: OutputFormat, action: &str, path: &str) {
    match format {
        OutputFormat::Text => println!("{} {} {}", "✓".green().bold(), action, path.bold()),
        OutputFormat::Json => {
            println!("{}", json!({ "status": "ok", "action": action, "path": path }))
        }
    }
}

fn cmd_tree(session: &Session, args: TreeArgs, format: OutputFormat) -> anyhow::Result<()> {
    let nodes: Vec<Arc<Node>> = match &args.path {
        Some(path) => vec![lookup(session, path)?],
        None => session.snapshot().roots().to_vec(),
    };
    match format {
        OutputFormat::Text => {
            if nodes.is_empty() {
                println!("{}", "(empty)".dimmed());
            }
            for node in &nodes {
                print_node(node, 0);
            }
        }
        OutputFormat::Json => {
            let mut out = Map::new();
            for node in &nodes {
                out.insert(display_name(node), node_json(node));
            }
            println!("{}", serde_json::to_string_pretty(&Value::Object(out))?);
        }
    }
    Ok(())
}

/// The escaped last segment, so distinct names never print alike.
fn display_name(node: &Node) -> String {
    let key = node.path().to_key_string();
    match key.rsplit_once('/') {
        Some((_, name)) => name.to_owned(),
        None => key,
    }
}

fn print_node(node: &Node, depth: usize) {
    let indent = "  ".repeat(depth);
    match node.kind() {
        NodeKind::Bucket { children } => {
            println!("{indent}{}", format!("{}/", display_name(node)).blue().bold());
            for child in children {
                print_node(child, depth + 1);
            }
        }
        NodeKind::Key { value } => {
            println!(
                "{indent}{} = {}",
                display_name(node),
                values::preview(value, PREVIEW_WIDTH).dimmed()
            );
        }
    }
}

fn node_json(node: &Node) -> Value {
    match node.kind() {
        NodeKind::Bucket { children } => Value::Object(
            children
                .iter()
                .map(|child| (display_name(child), node_json(child)))
                .collect(),
        ),
        NodeKind::Key { value } => match serde_json::from_slice::<Value>(value) {
            Ok(parsed) => parsed,
            Err(_) => Value::String(String::from_utf8_lossy(value).into_owned()),
        },
    }
}

fn cmd_get(session: &mut Session, args: GetArgs, format: OutputFormat) -> anyhow::Result<()> {
    let path = parse_path(&args.path)?;
    let value = session.store_mut().get_key(&path)?;
    match format {
        OutputFormat::Text if args.raw => {
            let mut stdout = std::io::stdout().lock();
            stdout.write_all(&value)?;
            stdout.flush()?;
        }
        OutputFormat::Text => println!("{}", String::from_utf8_lossy(&values::pretty(&value))),
        OutputFormat::Json => println!(
            "{}",
            json!({
                "path": path.to_string(),
                "value": String::from_utf8_lossy(&value),
                "json": values::is_json(&value),
            })
        ),
    }
    Ok(())
}

fn cmd_mkbucket(
    session: &mut Session,
    args: PathArgs,
    format: OutputFormat,
) -> anyhow::Result<()> {
    let path = parse_new_path(&args.path)?;
    session.apply(|store| store.create_bucket(&path))?;
    report(format, "created bucket", &args.path);
    Ok(())
}

fn cmd_put(session: &mut Session, args: PutArgs, format: OutputFormat) -> anyhow::Result<()> {
    let parent = parse_new_path(&args.parent)?;
    validate_name(&args.name).context("invalid key name")?;
    let value = encode_value(args.value, args.raw);
    session.apply(|store| store.create_key(args.name.as_bytes(), &value, &parent))?;
    report(format, "created key", &format!("{}/{}", args.parent, args.name));
    Ok(())
}

fn cmd_update(
    session: &mut Session,
    args: UpdateArgs,
    format: OutputFormat,
) -> anyhow::Result<()> {
    let path = parse_path(&args.path)?;
    let value = encode_value(args.value, args.raw);
    session.apply(|store| store.update_key(&path, &value))?;
    report(format, "updated", &args.path);
    Ok(())
}

fn cmd_rm(session: &mut Session, args: PathArgs, format: OutputFormat) -> anyhow::Result<()> {
    let node = lookup(session, &args.path)?;
    session.apply(|store| store.delete_item(&node))?;
    report(format, "deleted", &args.path);
    Ok(())
}

fn cmd_empty(session: &mut Session, args: PathArgs, format: OutputFormat) -> anyhow::Result<()> {
    let path = parse_path(&args.path)?;
    session.apply(|store| store.empty_bucket(&path))?;
    report(format, "emptied", &args.path);
    Ok(())
}

fn cmd_rename(
    session: &mut Session,
    args: RenameArgs,
    format: OutputFormat,
) -> anyhow::Result<()> {
    validate_name(&args.new_name).context("invalid new name")?;
    let node = lookup(session, &args.path)?;
    session.apply(|store| store.rename_item(&node, args.new_name.as_bytes()))?;
    let renamed = node.path().sibling(args.new_name.as_bytes())?;
    report(format, "renamed to", &renamed.to_string());
    Ok(())
}

fn cmd_transfer(
    session: &mut Session,
    args: TransferArgs,
    format: OutputFormat,
    remove_source: bool,
) -> anyhow::Result<()> {
    let node = lookup(session, &args.src)?;
    let dst = parse_new_path(&args.dst)?;
    if remove_source {
        session.apply(|store| store.move_item(&node, &dst))?;
        report(format, "moved to", &args.dst);
    } else {
        session.apply(|store| store.copy_item(&node, &dst))?;
        report(format, "copied to", &args.dst);
    }
    Ok(())
}
