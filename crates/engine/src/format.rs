//! Wire formats for everything the engine prints.

use voxide_common::{FieldValue, Location, SYSTEM_DATA, SYSTEM_FIELD, SYSTEM_MOVE, SYSTEM_REMOVE};
use voxide_storage::NodeData;

use crate::queue::QueueItem;
use crate::registry::TypeRegistry;
use crate::world::WorldStats;

/// `x,y,z TYPE [field:value ...]`
pub fn node_line(registry: &TypeRegistry, location: Location, data: &NodeData) -> String {
    let node_type = registry.node_type(data.type_id);
    let mut line = format!("{location} {}", node_type.name);
    for (field, value) in node_type.fields.iter().zip(data.fields.iter()) {
        line.push_str(&format!(" {}:{value}", field.name));
    }
    line.push('\n');
    line
}

/// The default rendering for a vacant cell.
pub fn empty_node_line(registry: &TypeRegistry, location: Location) -> String {
    let default = registry.node_type(registry.default_type());
    format!("{location} {}\n", default.name)
}

/// `x,y,z value` or `x,y,z nil` for FIELD GET.
pub fn field_line(location: Location, value: Option<&FieldValue>) -> String {
    match value {
        Some(value) => format!("{location} {value}\n"),
        None => format!("{location} nil\n"),
    }
}

/// `Δtick src => dst KIND value` for queued messages.
pub fn message_line(
    registry: &TypeRegistry,
    tick: u64,
    current_tick: u64,
    source: Location,
    target: Location,
    kind: u32,
    value: &FieldValue,
) -> String {
    let kind_name = registry.kind_name(kind).unwrap_or("?");
    format!(
        "{} {source} => {target} {kind_name} {value}\n",
        tick.saturating_sub(current_tick)
    )
}

/// One line per applied structural mutation.
pub fn set_line(registry: &TypeRegistry, item: &QueueItem) -> String {
    let location = item.source.location;
    match item.kind {
        SYSTEM_MOVE => match &item.value {
            FieldValue::Direction(dir) => format!("{location} MOVE {dir}\n"),
            value => format!("{location} MOVE {value}\n"),
        },
        SYSTEM_REMOVE => format!("{location} REMOVE\n"),
        SYSTEM_DATA => format!("{location} DATA {}\n", item.value),
        SYSTEM_FIELD => {
            let node_type = registry.node_type(item.source.type_id);
            match node_type.fields.get(item.field as usize) {
                Some(field) => format!("{location} FIELD {}:{}\n", field.name, item.value),
                None => format!("{location} FIELD {}:{}\n", item.field, item.value),
            }
        }
        kind => format!("{location} {kind:#x} {}\n", item.value),
    }
}

/// The STATUS block, one `key: value` line per stat.
pub fn stats_lines(stats: &WorldStats) -> String {
    format!(
        "ticks: {}\nnodes: {}\ntree_depth: {}\nmessage_max_inputs: {}\nmessage_max_outputs: {}\nmessage_max_queued: {}\n",
        stats.ticks,
        stats.nodes,
        stats.tree_depth,
        stats.message_max_inputs,
        stats.message_max_outputs,
        stats.message_max_queued,
    )
}

/// The TYPE verb's detail block.
pub fn type_detail(registry: &TypeRegistry, name: &str) -> Option<String> {
    let type_id = registry.find_type(name)?;
    let node_type = registry.node_type(type_id);

    let mut out = format!("Name: {}\nFields:\n", node_type.name);
    for (ordinal, field) in node_type.fields.iter().enumerate() {
        out.push_str(&format!("  {ordinal}: {} {}\n", field.name, field.kind.name()));
    }
    out.push_str("Behaviors:\n");
    for (ordinal, behavior) in node_type.behaviors.iter().enumerate() {
        out.push_str(&format!(
            "  {ordinal}: {}\n",
            registry.behavior(*behavior).name
        ));
    }
    Some(out)
}

/// The TYPES verb: one name per line, in definition order.
pub fn type_list(registry: &TypeRegistry) -> String {
    let mut out = String::new();
    for node_type in registry.types() {
        out.push_str(&node_type.name);
        out.push('\n');
    }
    out
}
