//! The tick scheduler: fixpoint evaluation, propagation and structural
//! mutation, one tick at a time.
//!
//! A tick sweeps the live list, runs every behavior on its node's input,
//! and re-queues any node whose freshly emitted same-tick messages change a
//! neighbour's input. Passes repeat until the rerun pool drains or the pass
//! cap trips. Only then are messages delivered into per-node stores and
//! structural mutations applied, in insertion order.

use voxide_common::{Endpoint, Location, Message, Messages};
use voxide_storage::LocationMap;

use crate::error::EngineError;
use crate::format;
use crate::host::{BehaviorHost, Context};
use crate::printer::Printer;
use crate::queue::Queue;
use crate::registry::HostRef;
use crate::world::World;

/// Passes allowed within one tick before the logic-loop diagnostic fires.
const PASS_CAP: u32 = 16;

/// Output volume for a tick run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogLevel {
    /// Suppress set output.
    Quiet,
    /// Print applied structural mutations.
    #[default]
    Normal,
    /// Additionally print passes, visited nodes and queue contents.
    Verbose,
}

/// A deduplicated pool of nodes scheduled for the next pass.
struct Pool {
    order: Vec<Location>,
    seen: LocationMap<()>,
}

impl Pool {
    fn new(size_hint: usize) -> Self {
        Self {
            order: Vec::new(),
            seen: LocationMap::new(size_hint.max(1)),
        }
    }

    fn add(&mut self, location: Location) {
        if !self.seen.contains(location) {
            self.seen.insert(location, ());
            self.order.push(location);
        }
    }

    fn take(self) -> Vec<Location> {
        self.order
    }
}

pub(crate) fn run(
    world: &mut World,
    host: &dyn BehaviorHost,
    count: u32,
    level: LogLevel,
    printer: &mut dyn Printer,
) -> Result<(), EngineError> {
    for _ in 0..count {
        run_one(world, host, level, printer)?;
    }
    Ok(())
}

fn run_one(
    world: &mut World,
    host: &dyn BehaviorHost,
    level: LogLevel,
    printer: &mut dyn Printer,
) -> Result<(), EngineError> {
    let current_tick = world.ticks();
    let size_hint = world.size_hint();

    if level == LogLevel::Verbose {
        printer.out(format_args!("=== Tick {current_tick} ===\n"));
    }

    let mut messages = Queue::new(true, true, size_hint);
    let mut sets = Queue::new(false, true, size_hint);

    let mut pool = world.live_locations();
    let mut rerun = Pool::new(size_hint);
    let mut passes = 0u32;

    while !pool.is_empty() {
        if level == LogLevel::Verbose {
            printer.out(format_args!("--- Pass {passes} ({} nodes) ---\n", pool.len()));
        }

        for location in pool {
            let Some(type_id) = world.get_node(location).map(|data| data.type_id) else {
                continue;
            };

            if level == LogLevel::Verbose
                && let Some(data) = world.get_node(location)
            {
                printer.out(format_args!(
                    "{}",
                    format::node_line(world.registry(), location, data)
                ));
            }

            if passes > 0 {
                // The node is being recomputed; its previous emissions no
                // longer stand.
                messages.remove_source(location);
                sets.remove_source(location);
            }

            let input = find_input(world, location, &messages, current_tick);
            if world.max_inputs < input.len() {
                world.max_inputs = input.len();
            }

            let mut output = Queue::new(false, false, 0);

            let behavior_specs: Vec<(String, u32, HostRef)> = world
                .registry()
                .node_type(type_id)
                .behaviors
                .iter()
                .map(|&index| {
                    let behavior = world.registry().behavior(index);
                    (behavior.name.clone(), behavior.mask, behavior.host_ref)
                })
                .collect();

            let node = Endpoint { location, type_id };
            for (name, mask, host_ref) in behavior_specs {
                let filtered = input.filter(mask);
                let mut ctx = Context::new(
                    world,
                    node,
                    &filtered,
                    &mut output,
                    &mut sets,
                    current_tick,
                );
                host.run(host_ref, &mut ctx)
                    .map_err(|source| EngineError::Behavior { name, source })?;
            }

            let changed = match world.get_node_mut(location) {
                Some(data) => {
                    let changed = match &data.last_input {
                        Some((previous, tick)) => {
                            *tick != current_tick || !previous.set_equal(&input)
                        }
                        None => true,
                    };
                    if changed {
                        data.last_input = Some((input, current_tick));
                    }
                    changed
                }
                None => false,
            };

            if changed {
                for item in output.iter() {
                    debug_assert_ne!(item.target.location, item.source.location);
                    if item.tick == current_tick && !messages.contains(item) {
                        rerun.add(item.target.location);
                    }
                }
            }

            let merged = messages.merge(output);
            if world.max_outputs < merged {
                world.max_outputs = merged;
            }
        }

        pool = rerun.take();
        rerun = Pool::new(size_hint);

        if passes > PASS_CAP {
            tracing::warn!(tick = current_tick, "logic loop detected");
            printer.err(format_args!("Logic loop detected while performing tick\n"));
            break;
        }
        passes += 1;
    }

    if level == LogLevel::Verbose {
        printer.out(format_args!("Messages:\n"));
        print_queue_slice(world, &messages, printer, |tick| tick == current_tick);
        printer.out(format_args!("Queued:\n"));
        print_queue_slice(world, &messages, printer, |tick| tick > current_tick);
        printer.out(format_args!("Output:\n"));
    }

    deliver_messages(world, &messages);
    apply_sets(world, &sets, level, printer);

    world.advance_tick();
    Ok(())
}

/// A node's input for this tick: messages already stored on it, then fresh
/// queue entries targeting it.
fn find_input(
    world: &mut World,
    location: Location,
    messages: &Queue,
    current_tick: u64,
) -> Messages {
    let mut input = Messages::new();

    if let Some(data) = world.get_node_mut(location) {
        data.store.discard_old(current_tick);
        if let Some(stored) = data.store.find(current_tick) {
            for message in stored.iter() {
                input.push(message.clone());
            }
        }
    }

    if let Some((first, remaining)) = messages.find_by_target_and_tick(location, current_tick) {
        for item in messages
            .items_from(first)
            .take(remaining as usize)
            .take_while(|item| item.target.location == location && item.tick == current_tick)
        {
            input.push(Message {
                source: item.source,
                kind: item.kind,
                value: item.value.clone(),
            });
        }
    }

    input
}

/// Append every queued message into its target's store bucket, one bucket
/// reserve per contiguous (target, tick) run.
fn deliver_messages(world: &mut World, messages: &Queue) {
    let items: Vec<_> = messages.iter().collect();
    let mut index = 0;

    while index < items.len() {
        let first = items[index];
        let mut run = 1;
        while index + run < items.len() {
            let item = items[index + run];
            if item.target.location == first.target.location && item.tick == first.tick {
                run += 1;
            } else {
                break;
            }
        }

        if world.max_queued < run {
            world.max_queued = run;
        }

        if let Some(data) = world.get_node_mut(first.target.location) {
            let bucket = data.store.find_or_create(first.tick);
            bucket.reserve(run);
            for item in &items[index..index + run] {
                bucket.push(Message {
                    source: item.source,
                    kind: item.kind,
                    value: item.value.clone(),
                });
            }
        }

        index += run;
    }
}

/// Apply structural mutations in insertion order, logging applied entries.
fn apply_sets(world: &mut World, sets: &Queue, level: LogLevel, printer: &mut dyn Printer) {
    for item in sets.iter() {
        if world.apply_set(item) && level != LogLevel::Quiet {
            printer.out(format_args!("{}", format::set_line(world.registry(), item)));
        }
    }
}

fn print_queue_slice(
    world: &World,
    messages: &Queue,
    printer: &mut dyn Printer,
    select: impl Fn(u64) -> bool,
) {
    for item in messages.iter() {
        if select(item.tick) {
            printer.out(format_args!(
                "{}",
                format::message_line(
                    world.registry(),
                    item.tick,
                    world.ticks(),
                    item.source.location,
                    item.target.location,
                    item.kind,
                    &item.value,
                )
            ));
        }
    }
}
