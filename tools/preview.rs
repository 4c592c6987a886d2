/// Preview: interactive shell for playing rule tables against one character.
///
/// Usage: preview [--content <dir>] [--config <engine.ron>] [--seed <n>]
///
/// Commands:
///   show                       - print the character's attributes and training
///   set <attr> <n>             - set an attribute
///   personality <name>         - restart from a personality's starting record
///   train <action>             - reinforce a trained action once
///   scene <id>                 - show a scene's modifiers and whether it is unlocked
///   activities                 - list dating activities and their availability
///   do <activity> [scene]      - perform an activity and apply its effects
///   tension                    - affection/desire gap and balance advice
///   crisis [apply]             - check for a crisis, optionally applying it
///   endings                    - current emotional and sexual endings
///   events                     - roll random scenarios for this moment
///   seed <n>                   - rebuild the engine with a new seed
///   help                       - list commands
///   quit                       - exit

use relationship_engine::core::engine::{RelationshipEngine, RelationshipEngineBuilder};
use relationship_engine::core::ending::render_dual_ending;
use relationship_engine::core::scene::BASELINE_SCENE;
use relationship_engine::core::tension::{balance_suggestion, calculate_tension, check_crisis};
use relationship_engine::schema::character::{Attribute, CharacterRecord};
use std::io::{self, BufRead, Write};
use tracing_subscriber::EnvFilter;

const USER: &str = "preview";
const CHAT: &str = "local";

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let args: Vec<String> = std::env::args().collect();

    let mut content_dir = None;
    let mut config_path = None;
    let mut seed: u64 = 42;

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--help" | "-h" => {
                print_usage();
                return;
            }
            "--content" if i + 1 < args.len() => {
                i += 1;
                content_dir = Some(args[i].clone());
            }
            "--config" if i + 1 < args.len() => {
                i += 1;
                config_path = Some(args[i].clone());
            }
            "--seed" if i + 1 < args.len() => {
                i += 1;
                seed = args[i].parse().unwrap_or(42);
            }
            _ => {
                eprintln!("Unknown argument: {}", args[i]);
                print_usage();
                std::process::exit(1);
            }
        }
        i += 1;
    }

    let builder = || {
        let mut builder = RelationshipEngine::builder();
        if let Some(ref dir) = content_dir {
            builder = builder.content_dir(dir);
        }
        if let Some(ref path) = config_path {
            builder = builder.config_file(path);
        }
        builder
    };

    let mut engine = match build_engine(builder(), seed) {
        Some(e) => e,
        None => std::process::exit(1),
    };
    let mut current_seed = seed;
    let mut record = CharacterRecord::new(USER, CHAT);

    println!("Seed: {}", current_seed);
    println!("Type 'help' for commands.\n");

    let stdin = io::stdin();
    let mut stdout = io::stdout();

    loop {
        print!("preview> ");
        stdout.flush().ok();

        let mut line = String::new();
        if stdin.lock().read_line(&mut line).is_err() || line.is_empty() {
            break;
        }
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        let parts: Vec<&str> = line.split_whitespace().collect();
        let cmd = parts[0].to_lowercase();

        match cmd.as_str() {
            "quit" | "exit" | "q" => {
                println!("Goodbye.");
                break;
            }
            "help" | "h" | "?" => {
                print_help();
            }
            "show" => {
                print_record(&engine, &record);
            }
            "set" => {
                if parts.len() < 3 {
                    println!("Usage: set <attr> <n>");
                    let names: Vec<&str> = Attribute::ALL.iter().map(|a| a.name()).collect();
                    println!("  attrs: {}", names.join(", "));
                    continue;
                }
                let Some(attr) = Attribute::from_name(parts[1]) else {
                    println!("Unknown attribute: {}", parts[1]);
                    continue;
                };
                match parts[2].parse::<i64>() {
                    Ok(n) => {
                        record.set(attr, n);
                        println!("{} = {}", attr, record.get(attr));
                    }
                    Err(_) => println!("Invalid number: {}", parts[2]),
                }
            }
            "personality" => {
                if parts.len() < 2 {
                    let mut names: Vec<&String> =
                        engine.personalities().personalities.keys().collect();
                    names.sort();
                    println!("Usage: personality <name>");
                    for name in names {
                        println!("  {}", name);
                    }
                    continue;
                }
                if engine.personalities().get(parts[1]).is_none() {
                    println!("Unknown personality: {}", parts[1]);
                    continue;
                }
                record = engine.personalities().starting_record(USER, CHAT, parts[1]);
                println!("Restarted as '{}'.", parts[1]);
                print_record(&engine, &record);
            }
            "train" => {
                if parts.len() < 2 {
                    let mut names: Vec<&String> = engine.training().actions.keys().collect();
                    names.sort();
                    println!("Usage: train <action>");
                    for name in names {
                        println!("  {}", name);
                    }
                    continue;
                }
                let action = parts[1];
                if engine.training().get(action).is_none() {
                    println!("'{}' is not a trained action", action);
                    continue;
                }
                let update = engine.training().add_progress(&mut record, action);
                let (multiplier, label) = engine.training().resistance_modifier(&record, action);
                println!(
                    "{}: {}% -> {}% ({}, x{})",
                    action, update.old, update.new, label, multiplier
                );
                if update.unlocked {
                    println!("Mastered! Unlocked: {}", update.unlocked_variants.join(", "));
                }
            }
            "scene" => {
                if parts.len() < 2 {
                    println!("Usage: scene <id>");
                    for scene in engine.scenes().unlocked_scenes(&record) {
                        println!("  {} ({})", scene.id, scene.name);
                    }
                    continue;
                }
                let scene = engine.scene(parts[1]);
                println!(
                    "{}: x{} effects, shame {:+}, arousal {:+}",
                    scene.name, scene.effect_multiplier, scene.shame_modifier, scene.arousal_bonus
                );
                match engine.scenes().check_unlocked(parts[1], &record) {
                    Ok(()) => println!("Unlocked."),
                    Err(lock) => println!("Locked: {}", lock),
                }
            }
            "activities" => {
                println!("{}", engine.activities().render_list(&record, engine.ledger()));
            }
            "do" => {
                if parts.len() < 2 {
                    println!("Usage: do <activity> [scene]");
                    continue;
                }
                let scene_id = parts.get(2).copied().unwrap_or(BASELINE_SCENE);
                match engine.do_activity(&mut record, parts[1], scene_id) {
                    Ok((outcome, hint)) => {
                        record.apply_effects(&outcome.effects);
                        println!("\n--- {} ---", parts[1]);
                        println!("{}", outcome.scene_text);
                        if !hint.is_empty() {
                            println!("{}", hint);
                        }
                        for (attr, delta) in &outcome.effects {
                            println!("  {} {:+}", attr, delta);
                        }
                        println!("--- End ---\n");
                    }
                    Err(refusal) => println!("Cannot do that: {}", refusal),
                }
            }
            "tension" => {
                let tension = calculate_tension(&record);
                println!("Gap {} ({})", tension.gap, tension.level);
                if let Some(warning) = tension.warning {
                    println!("{}", warning);
                }
                println!("{}", balance_suggestion(&record));
            }
            "crisis" => match check_crisis(&record) {
                Some(crisis) => {
                    println!("\n*** {} ***\n{}", crisis.title, crisis.narrative);
                    if parts.get(1) == Some(&"apply") {
                        crisis.apply(&mut record);
                        println!("Penalty applied.");
                    }
                }
                None => println!("No crisis."),
            },
            "endings" => {
                let emotional = engine.endings().check_emotion_ending(&record);
                let sexual = engine.endings().check_sexual_ending(&record);
                println!("{}", render_dual_ending(emotional, sexual, &record));
            }
            "events" => {
                let fired = engine.roll_scenarios(&mut record);
                if fired.is_empty() {
                    println!("Nothing happens.");
                }
                for scenario in fired {
                    println!("[{}] {}", scenario.name, scenario.template);
                }
            }
            "seed" => {
                if parts.len() < 2 {
                    println!("Current seed: {}", current_seed);
                    continue;
                }
                match parts[1].parse::<u64>() {
                    Ok(s) => match build_engine(builder(), s) {
                        Some(e) => {
                            engine = e;
                            current_seed = s;
                            println!("Seed set to {}", current_seed);
                        }
                        None => println!("Engine rebuild failed, keeping seed {}", current_seed),
                    },
                    Err(_) => {
                        println!("Invalid seed: {}", parts[1]);
                    }
                }
            }
            _ => {
                println!("Unknown command: '{}'. Type 'help' for commands.", cmd);
            }
        }
    }
}

fn build_engine(builder: RelationshipEngineBuilder, seed: u64) -> Option<RelationshipEngine> {
    match builder.seed(seed).build() {
        Ok(engine) => Some(engine),
        Err(e) => {
            eprintln!("ERROR: {}", e);
            None
        }
    }
}

fn print_record(engine: &RelationshipEngine, record: &CharacterRecord) {
    for attr in Attribute::ALL {
        println!("  {:<14} {}", attr.name(), record.get(attr));
    }
    println!("{}", engine.training().summary(record));
    let variants = engine.training().unlocked_variants(record);
    if !variants.is_empty() {
        println!("Unlocked variants: {}", variants.join(", "));
    }
}

fn print_usage() {
    println!("Usage: preview [--content <dir>] [--config <engine.ron>] [--seed <n>]");
}

fn print_help() {
    println!("Commands:");
    println!("  show                   - print attributes and training");
    println!("  set <attr> <n>         - set an attribute");
    println!("  personality <name>     - restart from a personality");
    println!("  train <action>         - reinforce a trained action");
    println!("  scene <id>             - scene modifiers and lock state");
    println!("  activities             - list dating activities");
    println!("  do <activity> [scene]  - perform an activity");
    println!("  tension                - affection/desire balance");
    println!("  crisis [apply]         - check for a crisis");
    println!("  endings                - current endings");
    println!("  events                 - roll random scenarios");
    println!("  seed <n>               - set RNG seed");
    println!("  help                   - this list");
    println!("  quit                   - exit");
}
