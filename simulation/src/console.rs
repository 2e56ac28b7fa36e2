//! Line-oriented console for inspecting and mutating a running simulation
//!
//! Each input line parses into a [`Command`]; [`Console::execute`] applies it
//! and renders the result as plain text. Invalid references come back as
//! messages so an interactive session never aborts on a typo.

use std::io::{self, BufRead, Write};
use std::path::PathBuf;
use std::str::FromStr;

use thiserror::Error;

use murmur_core::{Archetype, ConfigError, NodeIndex};

use crate::simulation::Simulation;

pub const HELP: &str = "\
Commands:
  step [n]                         run n steps (default 1)
  show attribute_space [nodes..]   true opinions
  show neighbors [nodes..]         influencing nodes
  show types [nodes..]             archetypes
  show resistance [nodes..]        resistance values
  show weights [nodes..]           raw incoming weights
  show normalized_weights [nodes..] normalized incoming weights
  show masks [nodes..]             perceived neighbour opinions
  show reward <node> [parents..]   reward from each neighbour
  show local_average <nodes..>     local averages
  show type_average <TAG>          mean opinion of one archetype
  show global_average              mean opinion of every node
  show density                     graph density
  set type <node> <TAG>            change a node's archetype
  set resistance [all] <r>         set every node's resistance
  set resistance <node|TAG> <r>    set one node's or archetype's resistance
  connect <a> <b>                  make a influence b
  disconnect <a> <b>               stop a influencing b
  reveal <a> <b> <k>               show coordinate k of a to b
  hide <a> <b> <k>                 hide coordinate k of a from b
  save <file>                      write state as JSON
  quit                             leave the console";

/// Errors parsing a console line
#[derive(Debug, Clone, PartialEq, Error)]
pub enum CommandError {
    #[error("Empty command")]
    Empty,

    #[error("Unknown command: '{0}'")]
    Unknown(String),

    #[error("Missing argument: {0}")]
    MissingArgument(&'static str),

    #[error("Invalid number: '{0}'")]
    InvalidNumber(String),

    #[error(transparent)]
    Config(#[from] ConfigError),
}

/// Read-only queries
#[derive(Debug, Clone, PartialEq)]
pub enum Query {
    AttributeSpace(Vec<NodeIndex>),
    Neighbors(Vec<NodeIndex>),
    Types(Vec<NodeIndex>),
    Resistance(Vec<NodeIndex>),
    Weights(Vec<NodeIndex>),
    NormalizedWeights(Vec<NodeIndex>),
    Masks(Vec<NodeIndex>),
    Reward {
        node: NodeIndex,
        parents: Vec<NodeIndex>,
    },
    LocalAverage(Vec<NodeIndex>),
    TypeAverage(Archetype),
    GlobalAverage,
    Density,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ResistanceTarget {
    All,
    Node(NodeIndex),
    Archetype(Archetype),
}

#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    Step(usize),
    Show(Query),
    SetType {
        node: NodeIndex,
        archetype: Archetype,
    },
    SetResistance {
        target: ResistanceTarget,
        value: f64,
    },
    Connect {
        from: NodeIndex,
        to: NodeIndex,
    },
    Disconnect {
        from: NodeIndex,
        to: NodeIndex,
    },
    Reveal {
        from: NodeIndex,
        to: NodeIndex,
        dim: usize,
    },
    Hide {
        from: NodeIndex,
        to: NodeIndex,
        dim: usize,
    },
    Save(PathBuf),
    Help,
    Quit,
}

/// What the console should do after a command
#[derive(Debug, Clone, PartialEq)]
pub enum CommandOutcome {
    Continue(String),
    Quit,
}

fn number<T: FromStr>(token: Option<&str>, name: &'static str) -> Result<T, CommandError> {
    let token = token.ok_or(CommandError::MissingArgument(name))?;
    token
        .parse()
        .map_err(|_| CommandError::InvalidNumber(token.to_string()))
}

fn node_list<'a>(tokens: impl Iterator<Item = &'a str>) -> Result<Vec<NodeIndex>, CommandError> {
    tokens.map(|t| number(Some(t), "node")).collect()
}

impl Command {
    /// Parse one console line
    pub fn parse(line: &str) -> Result<Self, CommandError> {
        let mut tokens = line.split_whitespace();
        let head = tokens.next().ok_or(CommandError::Empty)?;

        match head.to_ascii_lowercase().as_str() {
            "step" => match tokens.next() {
                None => Ok(Command::Step(1)),
                token => Ok(Command::Step(number(token, "steps")?)),
            },
            "show" => {
                let what = tokens.next().ok_or(CommandError::MissingArgument("what to show"))?;
                let query = match what.to_ascii_lowercase().as_str() {
                    "attribute_space" | "attributes" => Query::AttributeSpace(node_list(tokens)?),
                    "neighbors" => Query::Neighbors(node_list(tokens)?),
                    "types" => Query::Types(node_list(tokens)?),
                    "resistance" => Query::Resistance(node_list(tokens)?),
                    "weights" => Query::Weights(node_list(tokens)?),
                    "normalized_weights" => Query::NormalizedWeights(node_list(tokens)?),
                    "masks" => Query::Masks(node_list(tokens)?),
                    "reward" => Query::Reward {
                        node: number(tokens.next(), "node")?,
                        parents: node_list(tokens)?,
                    },
                    "local_average" => Query::LocalAverage(node_list(tokens)?),
                    "type_average" => Query::TypeAverage(
                        tokens
                            .next()
                            .ok_or(CommandError::MissingArgument("archetype"))?
                            .parse()?,
                    ),
                    "global_average" => Query::GlobalAverage,
                    "density" => Query::Density,
                    other => return Err(CommandError::Unknown(format!("show {other}"))),
                };
                Ok(Command::Show(query))
            }
            "set" => {
                let what = tokens.next().ok_or(CommandError::MissingArgument("what to set"))?;
                match what.to_ascii_lowercase().as_str() {
                    "type" => Ok(Command::SetType {
                        node: number(tokens.next(), "node")?,
                        archetype: tokens
                            .next()
                            .ok_or(CommandError::MissingArgument("archetype"))?
                            .parse()?,
                    }),
                    "resistance" => {
                        let first = tokens.next().ok_or(CommandError::MissingArgument("value"))?;
                        match tokens.next() {
                            None => Ok(Command::SetResistance {
                                target: ResistanceTarget::All,
                                value: number(Some(first), "value")?,
                            }),
                            value => {
                                let target = if first.eq_ignore_ascii_case("all") {
                                    ResistanceTarget::All
                                } else if let Ok(node) = first.parse::<NodeIndex>() {
                                    ResistanceTarget::Node(node)
                                } else {
                                    ResistanceTarget::Archetype(first.parse()?)
                                };
                                Ok(Command::SetResistance {
                                    target,
                                    value: number(value, "value")?,
                                })
                            }
                        }
                    }
                    other => Err(CommandError::Unknown(format!("set {other}"))),
                }
            }
            "connect" => Ok(Command::Connect {
                from: number(tokens.next(), "from")?,
                to: number(tokens.next(), "to")?,
            }),
            "disconnect" => Ok(Command::Disconnect {
                from: number(tokens.next(), "from")?,
                to: number(tokens.next(), "to")?,
            }),
            "reveal" => Ok(Command::Reveal {
                from: number(tokens.next(), "from")?,
                to: number(tokens.next(), "to")?,
                dim: number(tokens.next(), "dimension")?,
            }),
            "hide" => Ok(Command::Hide {
                from: number(tokens.next(), "from")?,
                to: number(tokens.next(), "to")?,
                dim: number(tokens.next(), "dimension")?,
            }),
            "save" => tokens
                .next()
                .map(|path| Command::Save(PathBuf::from(path)))
                .ok_or(CommandError::MissingArgument("file")),
            "help" | "?" => Ok(Command::Help),
            "quit" | "exit" | "q" => Ok(Command::Quit),
            other => Err(CommandError::Unknown(other.to_string())),
        }
    }
}

impl FromStr for Command {
    type Err = CommandError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Command::parse(s)
    }
}

/// Interactive front end over a simulation
pub struct Console<'a> {
    sim: &'a mut Simulation,
}

impl<'a> Console<'a> {
    pub fn new(sim: &'a mut Simulation) -> Self {
        Self { sim }
    }

    /// Apply a command and render its result
    pub fn execute(&mut self, command: Command) -> CommandOutcome {
        let text = match command {
            Command::Quit => return CommandOutcome::Quit,
            Command::Help => HELP.to_string(),
            Command::Step(steps) => {
                self.sim.run(steps);
                self.sim.state_summary()
            }
            Command::Show(query) => self.show(query),
            Command::SetType { node, archetype } => match self.sim.set_archetype(node, archetype) {
                Ok(()) => format!("Node {node} is now {archetype}"),
                Err(e) => e.to_string(),
            },
            Command::SetResistance { target, value } => {
                let result = match target {
                    ResistanceTarget::All => self
                        .sim
                        .set_resistance_all(value)
                        .map(|()| "Set resistance of every node".to_string())
                        .map_err(|e| e.to_string()),
                    ResistanceTarget::Node(node) => self
                        .sim
                        .set_resistance(node, value)
                        .map(|()| format!("Set resistance of node {node}"))
                        .map_err(|e| e.to_string()),
                    ResistanceTarget::Archetype(archetype) => self
                        .sim
                        .set_resistance_for(archetype, value)
                        .map(|count| format!("Set resistance of {count} {archetype} nodes"))
                        .map_err(|e| e.to_string()),
                };
                result.unwrap_or_else(|e| e)
            }
            Command::Connect { from, to } => match self.sim.connect(from, to) {
                Ok(true) => format!("Connected {from} -> {to}"),
                Ok(false) => format!("No new edge {from} -> {to}"),
                Err(e) => e.to_string(),
            },
            Command::Disconnect { from, to } => match self.sim.disconnect(from, to) {
                Ok(true) => format!("Disconnected {from} -> {to}"),
                Ok(false) => format!("Edge {from} -> {to} not removed"),
                Err(e) => e.to_string(),
            },
            Command::Reveal { from, to, dim } => match self.sim.reveal(from, to, dim) {
                Ok(()) => format!("Node {to} now sees dimension {dim} of node {from}"),
                Err(e) => e.to_string(),
            },
            Command::Hide { from, to, dim } => match self.sim.hide(from, to, dim) {
                Ok(()) => format!("Dimension {dim} of node {from} hidden from node {to}"),
                Err(e) => e.to_string(),
            },
            Command::Save(path) => match self.sim.save_json(&path) {
                Ok(()) => format!("Saved to {}", path.display()),
                Err(e) => e.to_string(),
            },
        };
        CommandOutcome::Continue(text)
    }

    /// Read commands from `input` until `quit` or end of input
    pub fn run<R: BufRead, W: Write>(&mut self, input: R, mut output: W) -> io::Result<()> {
        write!(output, "> ")?;
        output.flush()?;
        for line in input.lines() {
            let line = line?;
            if !line.trim().is_empty() {
                match Command::parse(&line) {
                    Ok(command) => match self.execute(command) {
                        CommandOutcome::Continue(text) => writeln!(output, "{text}")?,
                        CommandOutcome::Quit => return Ok(()),
                    },
                    Err(e) => writeln!(output, "{e}. Type 'help' for commands.")?,
                }
            }
            write!(output, "> ")?;
            output.flush()?;
        }
        Ok(())
    }

    /// Requested nodes, or every node when none were named
    fn select(&self, nodes: Vec<NodeIndex>, notes: &mut Vec<String>) -> Vec<NodeIndex> {
        let n = self.sim.node_count();
        if nodes.is_empty() {
            return (0..n).collect();
        }
        nodes
            .into_iter()
            .filter(|&node| {
                let known = node < n;
                if !known {
                    notes.push(format!("Node {node} not in graph. Skipping..."));
                }
                known
            })
            .collect()
    }

    fn show(&self, query: Query) -> String {
        let sim = &*self.sim;
        let mut notes = Vec::new();

        let body = match query {
            Query::Density => format!("Density: {:.4}", sim.graph().density()),
            Query::GlobalAverage => format!("Global average: {}", format_values(&sim.global_average())),
            Query::TypeAverage(archetype) => match sim.type_average(archetype) {
                Some(avg) => format!("{archetype} average: {}", format_values(&avg)),
                None => format!("No nodes of type {archetype}"),
            },
            Query::AttributeSpace(nodes) => {
                let rows = self
                    .select(nodes, &mut notes)
                    .into_iter()
                    .map(|node| vec![node.to_string(), format!("{:?}", sim.attributes().opinion(node))])
                    .collect();
                table(&["node", "opinion"], rows)
            }
            Query::Neighbors(nodes) => {
                let rows = self
                    .select(nodes, &mut notes)
                    .into_iter()
                    .map(|node| {
                        let nbrs: Vec<NodeIndex> = sim.graph().neighbors(node).iter().copied().collect();
                        vec![node.to_string(), format!("{nbrs:?}")]
                    })
                    .collect();
                table(&["node", "neighbors"], rows)
            }
            Query::Types(nodes) => {
                let rows = self
                    .select(nodes, &mut notes)
                    .into_iter()
                    .map(|node| vec![node.to_string(), sim.population().archetype(node).to_string()])
                    .collect();
                table(&["node", "type"], rows)
            }
            Query::Resistance(nodes) => {
                let rows = self
                    .select(nodes, &mut notes)
                    .into_iter()
                    .map(|node| vec![node.to_string(), format!("{:.3}", sim.resistance()[node])])
                    .collect();
                table(&["node", "resistance"], rows)
            }
            Query::Weights(nodes) => self.weight_table(nodes, false, &mut notes),
            Query::NormalizedWeights(nodes) => self.weight_table(nodes, true, &mut notes),
            Query::Masks(nodes) => {
                let mut rows = Vec::new();
                for node in self.select(nodes, &mut notes) {
                    for &parent in sim.graph().neighbors(node) {
                        rows.push(vec![
                            node.to_string(),
                            parent.to_string(),
                            format!("{:?}", sim.masks().row(node, parent)),
                        ]);
                    }
                }
                table(&["node", "parent", "perceived"], rows)
            }
            Query::Reward { node, parents } => {
                if node >= sim.node_count() {
                    return format!("Node {node} not in graph");
                }
                let parents = if parents.is_empty() {
                    sim.graph().neighbors(node).iter().copied().collect()
                } else {
                    parents
                };
                let mut rows = Vec::new();
                for parent in parents {
                    if !sim.graph().has_edge(parent, node) {
                        notes.push(format!("Nodes {parent} and {node} are not connected."));
                        continue;
                    }
                    if let Ok(reward) = sim.reward_for_neighbor(node, parent) {
                        rows.push(vec![parent.to_string(), format!("{reward:.3}")]);
                    }
                }
                if let Ok(total) = sim.reward_for_node(node) {
                    notes.push(format!("Mean reward for node {node}: {total:.3}"));
                }
                table(&["parent", "reward"], rows)
            }
            Query::LocalAverage(nodes) => {
                let rows = self
                    .select(nodes, &mut notes)
                    .into_iter()
                    .filter_map(|node| {
                        sim.local_average(node)
                            .ok()
                            .map(|avg| vec![node.to_string(), format_values(&avg)])
                    })
                    .collect();
                table(&["node", "local average"], rows)
            }
        };

        notes.insert(0, body);
        notes.join("\n")
    }

    fn weight_table(&self, nodes: Vec<NodeIndex>, normalized: bool, notes: &mut Vec<String>) -> String {
        let sim = &*self.sim;
        let mut rows = Vec::new();
        for node in self.select(nodes, notes) {
            let weight = |from| {
                if normalized {
                    sim.weights().normalized(from, node)
                } else {
                    sim.weights().raw(from, node)
                }
            };
            rows.push(vec![node.to_string(), "self".to_string(), format!("{:.4}", weight(node))]);
            for &parent in sim.graph().neighbors(node) {
                rows.push(vec![node.to_string(), parent.to_string(), format!("{:.4}", weight(parent))]);
            }
        }
        table(&["node", "from", "weight"], rows)
    }
}

fn format_values(values: &[f64]) -> String {
    let parts: Vec<String> = values.iter().map(|v| format!("{v:+.3}")).collect();
    format!("[{}]", parts.join(", "))
}

/// Left-aligned plain-text table
fn table(headers: &[&str], rows: Vec<Vec<String>>) -> String {
    let mut widths: Vec<usize> = headers.iter().map(|h| h.len()).collect();
    for row in &rows {
        for (width, cell) in widths.iter_mut().zip(row) {
            *width = (*width).max(cell.len());
        }
    }

    let rules: Vec<String> = widths.iter().map(|&w| "-".repeat(w)).collect();
    let mut lines = vec![render_row(headers, &widths), render_row(&rules, &widths)];
    for row in &rows {
        lines.push(render_row(row, &widths));
    }
    lines.join("\n")
}

fn render_row<S: AsRef<str>>(cells: &[S], widths: &[usize]) -> String {
    cells
        .iter()
        .zip(widths)
        .map(|(cell, &width)| format!("{:<width$}", cell.as_ref()))
        .collect::<Vec<_>>()
        .join("  ")
        .trim_end()
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use murmur_core::NetworkConfig;

    fn sim() -> Simulation {
        Simulation::new(NetworkConfig {
            n: 4,
            topology: "cycle".into(),
            dimensions: 2,
            seed: Some(17),
            ..Default::default()
        })
    }

    fn text(outcome: CommandOutcome) -> String {
        match outcome {
            CommandOutcome::Continue(text) => text,
            CommandOutcome::Quit => panic!("unexpected quit"),
        }
    }

    #[test]
    fn test_parse_commands() {
        assert_eq!(Command::parse("step").unwrap(), Command::Step(1));
        assert_eq!(Command::parse("step 10").unwrap(), Command::Step(10));
        assert_eq!(
            Command::parse("show attribute_space 1 2").unwrap(),
            Command::Show(Query::AttributeSpace(vec![1, 2]))
        );
        assert_eq!(
            Command::parse("show reward 3").unwrap(),
            Command::Show(Query::Reward { node: 3, parents: vec![] })
        );
        assert_eq!(
            Command::parse("set type 2 rwc").unwrap(),
            Command::SetType { node: 2, archetype: Archetype::RWC }
        );
        assert_eq!(
            Command::parse("set resistance 0.5").unwrap(),
            Command::SetResistance { target: ResistanceTarget::All, value: 0.5 }
        );
        assert_eq!(
            Command::parse("set resistance 3 0.5").unwrap(),
            Command::SetResistance { target: ResistanceTarget::Node(3), value: 0.5 }
        );
        assert_eq!(
            Command::parse("set resistance DA 0.5").unwrap(),
            Command::SetResistance { target: ResistanceTarget::Archetype(Archetype::DA), value: 0.5 }
        );
        assert_eq!(
            Command::parse("reveal 0 1 1").unwrap(),
            Command::Reveal { from: 0, to: 1, dim: 1 }
        );
        assert_eq!(Command::parse("quit").unwrap(), Command::Quit);
    }

    #[test]
    fn test_parse_errors() {
        assert_eq!(Command::parse("   "), Err(CommandError::Empty));
        assert_eq!(Command::parse("jump"), Err(CommandError::Unknown("jump".into())));
        assert_eq!(Command::parse("connect 1"), Err(CommandError::MissingArgument("to")));
        assert_eq!(Command::parse("step many"), Err(CommandError::InvalidNumber("many".into())));
        assert!(matches!(
            Command::parse("set type 1 hom"),
            Err(CommandError::Config(ConfigError::UnknownArchetype(_)))
        ));
    }

    #[test]
    fn test_show_queries() {
        let mut sim = sim();
        let mut console = Console::new(&mut sim);

        let out = text(console.execute(Command::Show(Query::Neighbors(vec![0, 9]))));
        assert!(out.contains("[1, 3]"));
        assert!(out.contains("Node 9 not in graph. Skipping..."));

        let out = text(console.execute(Command::Show(Query::Density)));
        assert_eq!(out, "Density: 0.6667");

        let out = text(console.execute(Command::Show(Query::Reward { node: 0, parents: vec![2] })));
        assert!(out.contains("Nodes 2 and 0 are not connected."));

        let out = text(console.execute(Command::Show(Query::TypeAverage(Archetype::SR))));
        assert_eq!(out, "No nodes of type SR");
    }

    #[test]
    fn test_mutations_report_errors() {
        let mut sim = sim();
        let mut console = Console::new(&mut sim);

        let out = text(console.execute(Command::Reveal { from: 0, to: 2, dim: 0 }));
        assert_eq!(out, "Nodes 0 and 2 are not connected");

        let out = text(console.execute(Command::Connect { from: 0, to: 2 }));
        assert_eq!(out, "Connected 0 -> 2");

        let out = text(console.execute(Command::SetResistance {
            target: ResistanceTarget::All,
            value: 2.0,
        }));
        assert!(out.contains("must be between 0 and 1"));

        assert_eq!(console.execute(Command::Quit), CommandOutcome::Quit);
        assert!(sim.graph().has_edge(0, 2));
    }

    #[test]
    fn test_run_loop() {
        let mut sim = sim();
        let input = b"step 2\nbogus\nshow density\nquit\nstep\n";
        let mut output = Vec::new();
        Console::new(&mut sim).run(&input[..], &mut output).unwrap();

        let output = String::from_utf8(output).unwrap();
        assert!(output.contains("Tick 2"));
        assert!(output.contains("Unknown command: 'bogus'"));
        assert!(output.contains("Density"));
        assert_eq!(sim.tick, 2);
    }
}
