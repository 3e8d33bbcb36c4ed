use std::path::Path;
use std::sync::Arc;

use anyhow::Context;
use colored::Colorize;
use serde_json::{json, Value};
use stonepaper_identity::StaticIdentity;
use stonepaper_registry::{Operation, Registry, RegistryConfig, RegistryError};
use stonepaper_store::{InMemoryStateStore, RichQuery};
use stonepaper_types::DocHash;

use crate::cli::*;

pub fn run_command(cli: Cli) -> anyhow::Result<()> {
    match cli.command {
        Command::Invoke(args) => cmd_invoke(&cli.state, cli.format, args),
        Command::Hash(args) => cmd_hash(cli.format, args),
        Command::Query(args) => cmd_query(&cli.state, cli.format, args),
    }
}

fn cmd_invoke(state: &Path, format: OutputFormat, args: InvokeArgs) -> anyhow::Result<()> {
    let store = Arc::new(
        InMemoryStateStore::open(state)
            .with_context(|| format!("opening world state {}", state.display()))?,
    );
    let config = match &args.config {
        Some(path) => RegistryConfig::load(path)?,
        None => RegistryConfig::default(),
    };
    let identity = build_identity(&args)?;

    match invoke(&store, identity, config, &args.function, &args.args) {
        Ok(payload) => {
            if is_mutation(&args.function) {
                store
                    .save(state)
                    .with_context(|| format!("saving world state {}", state.display()))?;
            }
            print_payload(format, &args.function, &payload);
            Ok(())
        }
        Err(err) => report_error(format, &err),
    }
}

/// Run one invocation against `store`.
pub fn invoke(
    store: &Arc<InMemoryStateStore>,
    identity: StaticIdentity,
    config: RegistryConfig,
    function: &str,
    args: &[String],
) -> Result<Vec<u8>, RegistryError> {
    let registry = Registry::new(store.clone(), store.clone(), Arc::new(identity), config);
    registry.invoke(function, args)
}

fn build_identity(args: &InvokeArgs) -> anyhow::Result<StaticIdentity> {
    if let Some(payload) = &args.attrs_json {
        return StaticIdentity::from_attrs_json(args.caller.clone(), payload)
            .context("parsing --attrs-json");
    }
    Ok(args
        .attrs
        .iter()
        .fold(StaticIdentity::new(args.caller.clone()), |id, (name, value)| {
            id.with_attribute(name.clone(), value.clone())
        }))
}

fn is_mutation(function: &str) -> bool {
    function
        .parse::<Operation>()
        .map(|op| op.is_mutating())
        .unwrap_or(false)
}

fn cmd_hash(format: OutputFormat, args: HashArgs) -> anyhow::Result<()> {
    let content = std::fs::read(&args.path)
        .with_context(|| format!("reading {}", args.path.display()))?;
    let hash = DocHash::of_content(&content);
    match format {
        OutputFormat::Text => println!("{}  {}", hash.as_str().yellow(), args.path.display()),
        OutputFormat::Json => println!(
            "{}",
            json!({ "path": args.path.display().to_string(), "docHash": hash.as_str() })
        ),
    }
    Ok(())
}

fn cmd_query(state: &Path, format: OutputFormat, args: QueryArgs) -> anyhow::Result<()> {
    let store = InMemoryStateStore::open(state)
        .with_context(|| format!("opening world state {}", state.display()))?;
    let raw = store.query(&args.query).context("running query")?;
    print_payload(format, "query", &raw);
    Ok(())
}

fn print_payload(format: OutputFormat, function: &str, payload: &[u8]) {
    let parsed: Option<Value> = serde_json::from_slice(payload).ok();
    match format {
        OutputFormat::Json => {
            let payload = parsed
                .unwrap_or_else(|| Value::String(String::from_utf8_lossy(payload).into_owned()));
            println!("{}", json!({ "status": "ok", "function": function, "payload": payload }));
        }
        OutputFormat::Text => {
            if payload.is_empty() {
                println!("{} {}", "✓".green().bold(), function.bold());
                return;
            }
            match parsed.and_then(|v| serde_json::to_string_pretty(&v).ok()) {
                Some(pretty) => println!("{pretty}"),
                None => println!("{}", String::from_utf8_lossy(payload)),
            }
        }
    }
}

fn report_error(format: OutputFormat, err: &RegistryError) -> anyhow::Result<()> {
    if format == OutputFormat::Json {
        println!(
            "{}",
            json!({ "status": "error", "code": err.code(), "message": err.to_string() })
        );
        std::process::exit(1);
    }
    Err(anyhow::anyhow!("{}: {err}", err.code()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use stonepaper_registry::CreatorMode;
    use stonepaper_store::StateStore;
    use stonepaper_types::DocumentRecord;

    fn args(values: &[&str]) -> Vec<String> {
        values.iter().map(|s| s.to_string()).collect()
    }

    fn invoke_args(caller: &str, attrs: &[(&str, &str)], attrs_json: Option<&str>) -> InvokeArgs {
        InvokeArgs {
            config: None,
            caller: caller.into(),
            attrs: attrs
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
            attrs_json: attrs_json.map(str::to_string),
            function: "createDoc".into(),
            args: Vec::new(),
        }
    }

    #[test]
    fn invoke_registers_against_store() {
        let store = Arc::new(InMemoryStateStore::new());
        let out = invoke(
            &store,
            StaticIdentity::new("peer"),
            RegistryConfig::default(),
            "createDoc",
            &args(&["h", "1", "s", "2"]),
        )
        .unwrap();
        assert!(out.is_empty());
        assert!(store.get_state("h").unwrap().is_some());
    }

    #[test]
    fn identity_from_flags() {
        let id = build_identity(&invoke_args("peer", &[("username", "bob")], None)).unwrap();
        let store = Arc::new(InMemoryStateStore::new());
        let config = RegistryConfig {
            creator_mode: CreatorMode::Explicit,
            ..RegistryConfig::default()
        };
        invoke(&store, id, config, "createDoc", &args(&["h", "1", "s", "2", "bob"])).unwrap();
        let record = DocumentRecord::decode(&store.get_state("h").unwrap().unwrap()).unwrap();
        assert_eq!(record.creator, "bob-bob");
    }

    #[test]
    fn identity_from_attrs_json() {
        use stonepaper_identity::IdentityProvider;
        let id = build_identity(&invoke_args(
            "peer",
            &[],
            Some(r#"{"attrs":{"username":"carol"}}"#),
        ))
        .unwrap();
        assert_eq!(id.attribute("username").unwrap(), "carol");
        assert!(build_identity(&invoke_args("peer", &[], Some("{}"))).is_err());
    }

    #[test]
    fn only_mutations_persist() {
        assert!(is_mutation("createDoc"));
        assert!(!is_mutation("getDoc"));
        assert!(!is_mutation("bogus"));
    }

    #[test]
    fn state_survives_between_invocations() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("state.json");

        let mut create = invoke_args("peer", &[], None);
        create.args = args(&["h", "1", "s", "2"]);
        cmd_invoke(&path, OutputFormat::Text, create).unwrap();

        let store = Arc::new(InMemoryStateStore::open(&path).unwrap());
        let err = invoke(
            &store,
            StaticIdentity::new("peer"),
            RegistryConfig::default(),
            "createDoc",
            &args(&["h", "1", "s", "2"]),
        )
        .unwrap_err();
        assert!(matches!(err, RegistryError::Duplicate(_)));
    }

    #[test]
    fn overlapping_invocations_cannot_both_persist() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("state.json");
        let first = Arc::new(InMemoryStateStore::open(&path).unwrap());
        let second = Arc::new(InMemoryStateStore::open(&path).unwrap());

        // Both runs see an empty world state and pass the existence check.
        invoke(
            &first,
            StaticIdentity::new("alice"),
            RegistryConfig::default(),
            "createDoc",
            &args(&["h", "1", "first", "2"]),
        )
        .unwrap();
        invoke(
            &second,
            StaticIdentity::new("bob"),
            RegistryConfig::default(),
            "createDoc",
            &args(&["h", "1", "second", "2"]),
        )
        .unwrap();

        first.save(&path).unwrap();
        assert!(matches!(
            second.save(&path),
            Err(stonepaper_store::StoreError::MvccConflict { .. })
        ));

        let stored = InMemoryStateStore::open(&path).unwrap();
        let record = DocumentRecord::decode(&stored.get_state("h").unwrap().unwrap()).unwrap();
        assert_eq!(record.sub_contract, "first");
        assert_eq!(record.creator, "alice");
    }

    #[test]
    fn text_mode_errors_carry_code() {
        let err = report_error(
            OutputFormat::Text,
            &RegistryError::UnknownFunction("nope".into()),
        )
        .unwrap_err();
        assert!(err.to_string().starts_with("UnknownFunctionError: "));
    }
}
