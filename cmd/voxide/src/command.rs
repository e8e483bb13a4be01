//! The command language: parsing and execution.
//!
//! Commands are newline-terminated, verbs are case-insensitive, and
//! coordinates are per-axis scalars or `a..b[..step]` ranges joined by
//! commas; a region command targets the Cartesian product. Every error is
//! a one-liner on the error sink and never stops the session.

use voxide_common::{Direction, FieldKind, FieldValue, Location, Range, Region};
use voxide_engine::{format, BehaviorHost, LogLevel, Printer, World};

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum CommandError {
    #[error("Unknown command '{0}'")]
    UnknownVerb(String),

    #[error("'{0}' is not a coordinate range")]
    BadRange(String),

    #[error("'{0}' is not a tick count")]
    BadCount(String),

    #[error("'{0}' is not a field assignment (expected name=value)")]
    BadAssignment(String),

    #[error("{verb} requires {what}")]
    Missing { verb: &'static str, what: &'static str },
}

#[derive(Debug, PartialEq, Eq)]
pub enum Command {
    Ping,
    Status,
    NodeGet(Region),
    NodeSet {
        region: Region,
        type_name: String,
        assignments: Vec<(String, String)>,
    },
    FieldGet {
        region: Region,
        field: String,
    },
    FieldSet {
        region: Region,
        field: String,
        value: String,
    },
    Delete(Region),
    Tick {
        count: u32,
        level: Option<LogLevel>,
    },
    Messages,
    Types,
    TypeShow(String),
}

/// Parse one input line. Blank lines parse to `None`.
pub fn parse(line: &str) -> Result<Option<Command>, CommandError> {
    let tokens: Vec<&str> = line.split_whitespace().collect();
    let Some(verb) = tokens.first() else {
        return Ok(None);
    };

    let command = match verb.to_ascii_uppercase().as_str() {
        "PING" => Command::Ping,
        "STATUS" => Command::Status,
        "NODE" => parse_node(&tokens[1..])?,
        "FIELD" => parse_field(&tokens[1..])?,
        "DELETE" => Command::Delete(parse_region(tokens.get(1).copied().ok_or(
            CommandError::Missing {
                verb: "DELETE",
                what: "a region",
            },
        )?)?),
        "TICK" => parse_tick(&tokens[1..])?,
        "MESSAGES" => Command::Messages,
        "TYPES" => Command::Types,
        "TYPE" => Command::TypeShow(
            tokens
                .get(1)
                .copied()
                .ok_or(CommandError::Missing {
                    verb: "TYPE",
                    what: "a type name",
                })?
                .to_string(),
        ),
        other => return Err(CommandError::UnknownVerb(other.to_string())),
    };

    Ok(Some(command))
}

fn parse_node(tokens: &[&str]) -> Result<Command, CommandError> {
    match tokens.first().map(|token| token.to_ascii_uppercase()) {
        Some(ref sub) if sub == "GET" => {
            let region = parse_region(tokens.get(1).copied().ok_or(CommandError::Missing {
                verb: "NODE GET",
                what: "a region",
            })?)?;
            Ok(Command::NodeGet(region))
        }
        Some(ref sub) if sub == "SET" => {
            let region = parse_region(tokens.get(1).copied().ok_or(CommandError::Missing {
                verb: "NODE SET",
                what: "a region",
            })?)?;
            let type_name = tokens
                .get(2)
                .copied()
                .ok_or(CommandError::Missing {
                    verb: "NODE SET",
                    what: "a type name",
                })?
                .to_string();
            let mut assignments = Vec::new();
            for token in &tokens[3..] {
                let (name, value) = token
                    .split_once('=')
                    .ok_or_else(|| CommandError::BadAssignment(token.to_string()))?;
                assignments.push((name.to_string(), value.to_string()));
            }
            Ok(Command::NodeSet {
                region,
                type_name,
                assignments,
            })
        }
        _ => Err(CommandError::Missing {
            verb: "NODE",
            what: "GET or SET",
        }),
    }
}

fn parse_field(tokens: &[&str]) -> Result<Command, CommandError> {
    match tokens.first().map(|token| token.to_ascii_uppercase()) {
        Some(ref sub) if sub == "GET" => {
            let region = parse_region(tokens.get(1).copied().ok_or(CommandError::Missing {
                verb: "FIELD GET",
                what: "a region",
            })?)?;
            let field = tokens
                .get(2)
                .copied()
                .ok_or(CommandError::Missing {
                    verb: "FIELD GET",
                    what: "a field name",
                })?
                .to_string();
            Ok(Command::FieldGet { region, field })
        }
        Some(ref sub) if sub == "SET" => {
            let region = parse_region(tokens.get(1).copied().ok_or(CommandError::Missing {
                verb: "FIELD SET",
                what: "a region",
            })?)?;
            let field = tokens
                .get(2)
                .copied()
                .ok_or(CommandError::Missing {
                    verb: "FIELD SET",
                    what: "a field name",
                })?
                .to_string();
            let value = tokens
                .get(3)
                .copied()
                .ok_or(CommandError::Missing {
                    verb: "FIELD SET",
                    what: "a value",
                })?
                .to_string();
            Ok(Command::FieldSet {
                region,
                field,
                value,
            })
        }
        _ => Err(CommandError::Missing {
            verb: "FIELD",
            what: "GET or SET",
        }),
    }
}

fn parse_tick(tokens: &[&str]) -> Result<Command, CommandError> {
    let mut count = 1u32;
    let mut level = None;

    for token in tokens {
        match token.to_ascii_lowercase().as_str() {
            "--quiet" => level = Some(LogLevel::Quiet),
            "--verbose" => level = Some(LogLevel::Verbose),
            raw => {
                count = raw
                    .parse()
                    .map_err(|_| CommandError::BadCount(raw.to_string()))?;
            }
        }
    }

    Ok(Command::Tick { count, level })
}

/// `X,Y,Z` where each axis is a scalar or `a..b[..step]`.
fn parse_region(token: &str) -> Result<Region, CommandError> {
    let axes: Vec<&str> = token.split(',').collect();
    if axes.len() != 3 {
        return Err(CommandError::BadRange(token.to_string()));
    }

    let x = parse_range(axes[0]).ok_or_else(|| CommandError::BadRange(token.to_string()))?;
    let y = parse_range(axes[1]).ok_or_else(|| CommandError::BadRange(token.to_string()))?;
    let z = parse_range(axes[2]).ok_or_else(|| CommandError::BadRange(token.to_string()))?;
    Ok(Region::new(x, y, z))
}

fn parse_range(axis: &str) -> Option<Range> {
    let parts: Vec<&str> = axis.split("..").collect();
    match parts.as_slice() {
        [scalar] => Some(Range::scalar(scalar.parse().ok()?)),
        [start, end] => Some(Range::new(start.parse().ok()?, end.parse().ok()?, 1)),
        [start, end, step] => Some(Range::new(
            start.parse().ok()?,
            end.parse().ok()?,
            step.parse().ok()?,
        )),
        _ => None,
    }
}

/// Execute one parsed command against the world.
pub fn execute(
    command: Command,
    world: &mut World,
    host: &dyn BehaviorHost,
    printer: &mut dyn Printer,
) {
    match command {
        Command::Ping => printer.out(format_args!("PONG\n")),

        Command::Status => {
            printer.out(format_args!("{}", format::stats_lines(&world.stats())));
        }

        Command::NodeGet(region) => {
            for location in region.locations() {
                match world.get_node(location) {
                    Some(data) => printer.out(format_args!(
                        "{}",
                        format::node_line(world.registry(), location, data)
                    )),
                    None => printer.out(format_args!(
                        "{}",
                        format::empty_node_line(world.registry(), location)
                    )),
                }
            }
        }

        Command::NodeSet {
            region,
            type_name,
            assignments,
        } => {
            let Some(type_id) = world.registry().find_type(&type_name) else {
                printer.err(format_args!("Unknown type '{type_name}'\n"));
                return;
            };
            for location in region.locations() {
                world.set_node(location, type_id);
                for (name, value) in &assignments {
                    set_field_by_name(world, location, name, value, printer);
                }
            }
        }

        Command::FieldGet { region, field } => {
            for location in region.locations() {
                let value = world.get_node(location).and_then(|data| {
                    world
                        .registry()
                        .find_field(data.type_id, &field)
                        .and_then(|(ordinal, _)| data.field(ordinal))
                });
                printer.out(format_args!("{}", format::field_line(location, value)));
            }
        }

        Command::FieldSet {
            region,
            field,
            value,
        } => {
            for location in region.locations() {
                if world.get_node(location).is_none() {
                    let default = world.registry().node_type(world.registry().default_type());
                    printer.err(format_args!(
                        "The type '{}' doesn't have the field '{field}'\n",
                        default.name
                    ));
                    continue;
                }
                set_field_by_name(world, location, &field, &value, printer);
            }
        }

        Command::Delete(region) => {
            for location in region.locations() {
                world.remove_node(location);
            }
        }

        Command::Tick { count, level } => {
            let level = level.unwrap_or_default();
            if let Err(error) = world.run_ticks(host, count, level, printer) {
                printer.err(format_args!("{error}\n"));
            }
        }

        Command::Messages => world.print_messages(printer),

        Command::Types => {
            printer.out(format_args!("{}", format::type_list(world.registry())));
        }

        Command::TypeShow(name) => match format::type_detail(world.registry(), &name) {
            Some(detail) => printer.out(format_args!("{detail}")),
            None => printer.err(format_args!("Unknown type '{name}'\n")),
        },
    }
}

/// Assign one field on an existing node, reporting unknown fields and bad
/// values without giving up on the rest of the command.
fn set_field_by_name(
    world: &mut World,
    location: Location,
    name: &str,
    raw_value: &str,
    printer: &mut dyn Printer,
) {
    let Some(data) = world.get_node(location) else {
        return;
    };
    let type_id = data.type_id;
    let type_name = world.registry().node_type(type_id).name.clone();

    let Some((ordinal, kind)) = world.registry().find_field(type_id, name) else {
        printer.err(format_args!(
            "The type '{type_name}' doesn't have the field '{name}'\n"
        ));
        return;
    };

    let value = match kind {
        FieldKind::Integer => match raw_value.parse::<i32>() {
            Ok(parsed) => FieldValue::Integer(parsed),
            Err(_) => {
                printer.err(format_args!("'{raw_value}' is not an integer\n"));
                return;
            }
        },
        FieldKind::Direction => match raw_value.parse::<Direction>() {
            Ok(parsed) => FieldValue::Direction(parsed),
            Err(_) => {
                printer.err(format_args!("'{raw_value}' is not a direction\n"));
                return;
            }
        },
        FieldKind::Text => FieldValue::Text(raw_value.to_string()),
    };

    world.set_field(location, ordinal, value);
}
