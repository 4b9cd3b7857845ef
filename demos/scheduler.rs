use std::io::Write;
use std::path::PathBuf;

use timetabler::course::CatalogueTable;
use timetabler::serialize::{append_section, save_catalogue, SectionRecord, SessionRecord};
use timetabler::{Day, GridConfig, Request, Result, Scheduler};

const CATALOGUE: &str = "classes.json";
const OUTPUT: &str = "timetables.csv";

fn print_help() {
    println!("Commands:");
    println!("  ADD <name> <group> <day> <start> <end> [<day> <start> <end> ...]");
    println!("  REMOVE <name> <group>");
    println!("  LIST");
    println!("  FIND <file.csv> [<name,...>] [ON <day,...>]");
    println!("  IMPORT <file.csv> [<name,...>] [ON <day,...>]");
    println!("  SCHEDULE <k> [MUST <name,...>] [FREE <day,...>]");
    println!("  EXIT");
}

fn parse_sessions(args: &[&str]) -> Option<Vec<SessionRecord>> {
    if args.is_empty() || args.len() % 3 != 0 {
        return None;
    }
    Some(
        args.chunks(3)
            .map(|c| SessionRecord {
                day: c[0].to_string(),
                start_time: c[1].to_string(),
                end_time: c[2].to_string(),
                location: None,
            })
            .collect(),
    )
}

fn parse_request(args: &[&str]) -> Result<Option<Request>> {
    let Some(k) = args.first().and_then(|k| k.parse::<usize>().ok()) else {
        return Ok(None);
    };
    let mut request = Request::new(k);
    let mut rest = args[1..].iter();
    while let Some(flag) = rest.next() {
        let Some(value) = rest.next() else {
            return Ok(None);
        };
        match flag.to_uppercase().as_str() {
            "MUST" => request = request.with_mandatory(value.split(',')),
            "FREE" => {
                request = request.excluding(parse_days(value)?);
            }
            _ => return Ok(None),
        }
    }
    Ok(Some(request))
}

fn parse_days(value: &str) -> Result<Vec<Day>> {
    value.split(',').map(|d| d.parse::<Day>()).collect()
}

/// Loads a CSV catalogue and narrows it by class name prefixes and days.
fn find(args: &[&str]) -> Result<Option<CatalogueTable>> {
    let Some(file) = args.first() else {
        return Ok(None);
    };
    let (names, days) = match &args[1..] {
        [] => (None, None),
        [names] => (Some(*names), None),
        [on, days] if on.eq_ignore_ascii_case("ON") => (None, Some(*days)),
        [names, on, days] if on.eq_ignore_ascii_case("ON") => (Some(*names), Some(*days)),
        _ => return Ok(None),
    };

    let mut lazy = CatalogueTable::load(file)?.to_lazy();
    if let Some(names) = names {
        let names: Vec<&str> = names.split(',').collect();
        lazy = lazy.contains(&names);
    }
    if let Some(days) = days {
        lazy = lazy.on_days(&parse_days(days)?);
    }
    Ok(Some(lazy.collect()?))
}

fn schedule(scheduler: &Scheduler, request: &Request, config: &GridConfig) -> Result<()> {
    let timetables = scheduler.timetables(request)?;
    if timetables.is_empty() {
        println!("No timetables found with the current criteria. Consider adjusting the number of classes, mandatory classes, or free days.");
        return Ok(());
    }
    for (i, grid) in timetables.grids().iter().enumerate() {
        println!("Timetable {}", i + 1);
        println!("{}", grid.to_df(config)?);
    }
    timetables.write_csv(OUTPUT, config)?;
    println!("{} timetables written to {}", timetables.len(), OUTPUT);
    Ok(())
}

fn main() -> Result<()> {
    let path = PathBuf::from(CATALOGUE);
    let config = GridConfig::from_file("grid.toml").unwrap_or_default();
    let mut scheduler = match Scheduler::load(&path) {
        Ok(scheduler) => scheduler,
        Err(_) => Scheduler::new(Default::default()),
    };

    loop {
        println!("Current classes: {:?}", scheduler.class_names());

        print!("> ");
        std::io::stdout().flush()?;
        let mut input = String::new();
        if std::io::stdin().read_line(&mut input)? == 0 {
            break;
        }
        let input: Vec<&str> = input.split_whitespace().collect();

        if input.is_empty() {
            print!("\x1B[2J\x1B[1;1H");
            println!("Please enter a command");
            print_help();
            continue;
        }

        let outcome = match input[0].to_uppercase().as_str() {
            "ADD" | "+" if input.len() >= 3 => match parse_sessions(&input[3..]) {
                Some(sessions) => {
                    let record = SectionRecord {
                        name: input[1].to_string(),
                        group: input[2].to_string(),
                        sessions,
                    };
                    append_section(&path, &record).map(|section| {
                        println!("{}", section);
                        scheduler.catalogue_mut().add_section(section);
                    })
                }
                None => {
                    println!("Invalid command");
                    Ok(())
                }
            },
            "REMOVE" | "-" if input.len() == 3 => {
                match scheduler.catalogue_mut().remove_section(input[1], input[2]) {
                    Some(_) => save_catalogue(&path, scheduler.catalogue()),
                    None => {
                        println!("Class not found");
                        Ok(())
                    }
                }
            }
            "LIST" | "LS" => {
                print!("\x1B[2J\x1B[1;1H");
                scheduler.iter().for_each(|section| println!("{}\n", section));
                Ok(())
            }
            "FIND" => match find(&input[1..]) {
                Ok(Some(table)) => {
                    print!("\x1B[2J\x1B[1;1H");
                    println!("{}", table);
                    Ok(())
                }
                Ok(None) => {
                    println!("Invalid command");
                    Ok(())
                }
                Err(e) => Err(e),
            },
            "IMPORT" => match find(&input[1..]) {
                Ok(Some(table)) => table.to_catalogue().and_then(|found| {
                    for section in found.iter() {
                        scheduler.catalogue_mut().add_section(section.clone());
                    }
                    println!("Imported {} sections", found.len());
                    save_catalogue(&path, scheduler.catalogue())
                }),
                Ok(None) => {
                    println!("Invalid command");
                    Ok(())
                }
                Err(e) => Err(e),
            },
            "SCHEDULE" | "S" => match parse_request(&input[1..]) {
                Ok(Some(request)) => schedule(&scheduler, &request, &config),
                Ok(None) => {
                    println!("Invalid command");
                    Ok(())
                }
                Err(e) => Err(e),
            },
            "EXIT" => break,
            _ => {
                print!("\x1B[2J\x1B[1;1H");
                println!("Invalid command");
                print_help();
                Ok(())
            }
        };

        if let Err(e) = outcome {
            println!("An error occurred: {}", e);
        }
    }
    Ok(())
}
