//! Persisted circuit formats
//!
//! Primary format is plain text, one component per line:
//!
//! ```text
//! <id>;<CTYPE>;<param_string>;<input0>,<input1>,...
//! ```
//!
//! where each input is `NULL` or `<driver_id>:<driver_output_index>`.
//! Loading is two-phase: every line is parsed and keyed by its file-local
//! id before any wiring is resolved, so forward references across lines are
//! legal. Any malformed line aborts the whole load with a line-qualified
//! error and leaves nothing registered.
//!
//! The same model is also available as a JSON netlist (`CircuitDef`) for
//! machine consumers; both loaders share one resolution path.

use std::collections::HashMap;

use log::debug;
use serde::{Deserialize, Serialize};

use crate::catalog;
use crate::circuit::Circuit;
use crate::component::{ComponentId, Input};
use crate::error::{CircuitError, CircuitResult};

/// One wired input reference in a serialized circuit
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PinDef {
    pub id: u32,
    pub output: usize,
}

/// One component in a serialized circuit
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ComponentDef {
    /// File-local id; resolved to a fresh handle on load
    pub id: u32,
    #[serde(rename = "type")]
    pub ctype: String,
    #[serde(default)]
    pub params: String,
    /// One entry per input slot; `None` marks a floating slot
    pub inputs: Vec<Option<PinDef>>,
}

/// Serialized circuit: the unit of the JSON format
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CircuitDef {
    pub components: Vec<ComponentDef>,
}

impl Circuit {
    /// Serialize to the line-based text format, components in id order
    pub fn to_text(&self) -> String {
        let mut out = String::new();
        for def in self.to_def().components {
            let inputs: Vec<String> = def
                .inputs
                .iter()
                .map(|pin| match pin {
                    Some(PinDef { id, output }) => format!("{id}:{output}"),
                    None => "NULL".to_string(),
                })
                .collect();
            out.push_str(&format!(
                "{};{};{};{}\n",
                def.id,
                def.ctype,
                def.params,
                inputs.join(",")
            ));
        }
        out
    }

    /// Load a circuit from the line-based text format
    pub fn from_text(text: &str) -> CircuitResult<Circuit> {
        let mut entries = Vec::new();
        for (lineno, raw) in text.lines().enumerate() {
            let lineno = lineno + 1;
            let line = raw.trim();
            if line.is_empty() {
                continue;
            }
            entries.push((lineno, parse_line(lineno, line)?));
        }
        let circuit = build(&entries)?;
        debug!("loaded {} components from text", circuit.len());
        Ok(circuit)
    }

    /// Serialize to the JSON netlist form
    pub fn to_json(&self) -> String {
        // CircuitDef serialization cannot fail: it is strings and integers
        serde_json::to_string_pretty(&self.to_def()).expect("circuit def is always serializable")
    }

    /// Load a circuit from the JSON netlist form
    pub fn from_json(json: &str) -> CircuitResult<Circuit> {
        let def: CircuitDef = serde_json::from_str(json).map_err(|e| CircuitError::Format {
            line: e.line(),
            msg: format!("failed to parse circuit JSON: {e}"),
        })?;
        let entries: Vec<(usize, ComponentDef)> = def
            .components
            .into_iter()
            .enumerate()
            .map(|(i, d)| (i + 1, d))
            .collect();
        let circuit = build(&entries)?;
        debug!("loaded {} components from JSON", circuit.len());
        Ok(circuit)
    }

    /// Snapshot the graph as a serializable definition
    pub fn to_def(&self) -> CircuitDef {
        let components = self
            .components()
            .map(|c| {
                let inputs = c
                    .inputs()
                    .iter()
                    .map(|pin| match pin {
                        Input::Connected { driver, output } => Some(PinDef {
                            id: driver.raw(),
                            output: *output,
                        }),
                        Input::Floating => None,
                    })
                    .collect();
                ComponentDef {
                    id: c.id().raw(),
                    ctype: c.ctype(),
                    params: c.param_string(),
                    inputs,
                }
            })
            .collect();
        CircuitDef { components }
    }
}

fn format_err(line: usize, msg: impl Into<String>) -> CircuitError {
    CircuitError::Format { line, msg: msg.into() }
}

/// Parse one `id;CTYPE;params;inputs` line
fn parse_line(lineno: usize, line: &str) -> CircuitResult<ComponentDef> {
    let fields: Vec<&str> = line.split(';').collect();
    if fields.len() != 4 {
        return Err(format_err(
            lineno,
            format!("expected 4 ';'-separated fields, got {}", fields.len()),
        ));
    }
    let id_field = fields[0].trim();
    if id_field.is_empty() {
        return Err(format_err(lineno, "empty component id"));
    }
    let id: u32 = id_field
        .parse()
        .map_err(|_| format_err(lineno, format!("invalid component id {id_field:?}")))?;
    let ctype = fields[1].trim();
    if ctype.is_empty() {
        return Err(format_err(lineno, "missing component type"));
    }
    let inputs = parse_inputs(lineno, fields[3])?;
    Ok(ComponentDef {
        id,
        ctype: ctype.to_string(),
        params: fields[2].trim().to_string(),
        inputs,
    })
}

fn parse_inputs(lineno: usize, field: &str) -> CircuitResult<Vec<Option<PinDef>>> {
    let field = field.trim();
    if field.is_empty() {
        return Ok(Vec::new());
    }
    field
        .split(',')
        .map(|pin| {
            let pin = pin.trim();
            if pin == "NULL" {
                return Ok(None);
            }
            let (id, output) = pin
                .split_once(':')
                .ok_or_else(|| format_err(lineno, format!("invalid input reference {pin:?}")))?;
            let id: u32 = id
                .parse()
                .map_err(|_| format_err(lineno, format!("invalid driver id {pin:?}")))?;
            let output: usize = output
                .parse()
                .map_err(|_| format_err(lineno, format!("invalid driver output {pin:?}")))?;
            Ok(Some(PinDef { id, output }))
        })
        .collect()
}

/// Shared two-phase resolution: construct every component before wiring any
fn build(entries: &[(usize, ComponentDef)]) -> CircuitResult<Circuit> {
    let mut circuit = Circuit::new();
    let mut by_file_id: HashMap<u32, ComponentId> = HashMap::new();
    let mut created: Vec<ComponentId> = Vec::with_capacity(entries.len());

    for (lineno, def) in entries {
        let kind = catalog::from_ctype(&def.ctype).map_err(|e| e.at_line(*lineno))?;
        let arity = kind.arity();
        if def.inputs.len() != arity {
            return Err(format_err(
                *lineno,
                format!(
                    "component type {} expects {} inputs, got {}",
                    def.ctype,
                    arity,
                    def.inputs.len()
                ),
            ));
        }
        let id = circuit.add_kind(kind);
        if !def.params.is_empty() {
            circuit.set_params(id, &def.params).map_err(|e| e.at_line(*lineno))?;
        }
        if by_file_id.insert(def.id, id).is_some() {
            return Err(format_err(*lineno, format!("duplicate component id {}", def.id)));
        }
        created.push(id);
    }

    for ((lineno, def), id) in entries.iter().zip(&created) {
        for (slot, pin) in def.inputs.iter().enumerate() {
            let Some(PinDef { id: file_id, output }) = pin else {
                continue;
            };
            let driver = by_file_id.get(file_id).ok_or_else(|| {
                format_err(*lineno, format!("input {slot} references unknown component {file_id}"))
            })?;
            circuit
                .set_input(*id, slot, *driver, *output)
                .map_err(|e| e.at_line(*lineno))?;
        }
    }

    Ok(circuit)
}
