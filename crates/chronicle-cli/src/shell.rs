//! Interactive shell over a model and the in-memory engine

use std::collections::HashMap;
use std::fs;

use chronicle_model::{
    BytesNode, MappingNode, MemoryEngine, Model, Node, NodeType, Property, SheetNode, StepMessage,
    StructNode, VectorNode,
};
use chronicle_stream::{StreamReader, StreamWriter};
use chronicle_variant::Variant;
use rustyline::error::ReadlineError;
use rustyline::DefaultEditor;

use crate::render::print_node;

const HELP: &str = "\
Workspace
  new bytes [text] | new vector | new mapping | new sheet | new struct <arity>
                           create a free node, named n1, n2, ...
  ls                       list free workspace nodes

Transactions
  begin                    open a transaction
  commit [k=v ...]         commit with an optional message
  abort                    roll the open transaction back
  undo | redo              step through committed history
  steps                    show min/current/max step counters

Tree (paths are /seg/seg; segments index by position, key or sheet id)
  setroot <name|->         set the model root (within a transaction)
  print [path]             print the subtree at path (default root)
  bins <path> <i> <text>   insert text into a bytes node
  brep <path> <i> <text>   replace text in a bytes node
  brm <path> <i> <n>       remove bytes
  vins <path> <i> <name>   insert a workspace node into a vector
  vrm <path> <i> [n]       remove vector children
  vmv <path> <i> <n> <d>   move n children from i to pre-move dest d
  mset <path> <key> <val>  assign a mapping key (see values below)
  sins <path> <name>       insert a workspace node into a sheet
  srm <path> <id>          remove a sheet row by id
  sset <path> <i> <val>    assign a struct slot

Values: '-' empty | @name node | int:N uint:N float:X bool:B | plain text

Documents
  save <file> | load <file>
  reset                    clear model, history and index
  quit";

struct Shell {
    model: Model,
    workspace: HashMap<String, Node>,
    next_name: usize,
}

pub fn run(max_steps: Option<usize>) {
    let engine = match max_steps {
        Some(steps) => MemoryEngine::with_max_steps(steps),
        None => MemoryEngine::new(),
    };
    let mut shell = Shell {
        model: Model::new(Box::new(engine)),
        workspace: HashMap::new(),
        next_name: 0,
    };

    let mut editor = match DefaultEditor::new() {
        Ok(editor) => editor,
        Err(err) => {
            eprintln!("Error initializing line editor: {}", err);
            std::process::exit(1);
        }
    };

    println!("chronicle shell - type 'help' for commands");
    loop {
        let prompt = if shell.model.in_transaction() {
            "chronicle*> "
        } else {
            "chronicle> "
        };
        match editor.readline(prompt) {
            Ok(line) => {
                let line = line.trim().to_string();
                if line.is_empty() {
                    continue;
                }
                let _ = editor.add_history_entry(&line);
                let parts: Vec<&str> = line.split_whitespace().collect();
                if parts[0] == "quit" || parts[0] == "exit" {
                    break;
                }
                if let Err(message) = shell.dispatch(&parts) {
                    eprintln!("error: {}", message);
                }
            }
            Err(ReadlineError::Interrupted) | Err(ReadlineError::Eof) => break,
            Err(err) => {
                eprintln!("Error reading input: {}", err);
                break;
            }
        }
    }
}

type CmdResult = Result<(), String>;

impl Shell {
    fn dispatch(&mut self, parts: &[&str]) -> CmdResult {
        match parts[0] {
            "help" => {
                println!("{}", HELP);
                Ok(())
            }
            "new" => self.cmd_new(&parts[1..]),
            "ls" => self.cmd_ls(),
            "begin" => {
                self.ensure_idle()?;
                self.model.begin_transaction();
                Ok(())
            }
            "commit" => {
                self.ensure_open()?;
                let mut message = StepMessage::new();
                for pair in &parts[1..] {
                    if let Some((key, value)) = pair.split_once('=') {
                        message.insert(key.to_string(), value.to_string());
                    }
                }
                self.model.commit_transaction(message);
                println!("step {}", self.model.current_step());
                Ok(())
            }
            "abort" => {
                self.ensure_open()?;
                self.model.abort_transaction();
                Ok(())
            }
            "undo" => {
                self.ensure_idle()?;
                if !self.model.can_undo() {
                    return Err("nothing to undo".to_string());
                }
                self.model.undo();
                println!("step {}", self.model.current_step());
                Ok(())
            }
            "redo" => {
                self.ensure_idle()?;
                if !self.model.can_redo() {
                    return Err("nothing to redo".to_string());
                }
                self.model.redo();
                println!("step {}", self.model.current_step());
                Ok(())
            }
            "steps" => {
                println!(
                    "min {} current {} max {}",
                    self.model.minimum_step(),
                    self.model.current_step(),
                    self.model.maximum_step()
                );
                Ok(())
            }
            "setroot" => self.cmd_setroot(&parts[1..]),
            "print" => self.cmd_print(&parts[1..]),
            "bins" | "brep" | "brm" => self.cmd_bytes(parts),
            "vins" | "vrm" | "vmv" => self.cmd_vector(parts),
            "mset" => self.cmd_mset(&parts[1..]),
            "sins" | "srm" => self.cmd_sheet(parts),
            "sset" => self.cmd_sset(&parts[1..]),
            "save" => self.cmd_save(&parts[1..]),
            "load" => self.cmd_load(&parts[1..]),
            "reset" => {
                self.ensure_idle()?;
                self.model.reset();
                Ok(())
            }
            other => Err(format!("unknown command '{}', try 'help'", other)),
        }
    }

    fn ensure_idle(&self) -> CmdResult {
        if self.model.in_transaction() {
            return Err("a transaction is open".to_string());
        }
        Ok(())
    }

    fn ensure_open(&self) -> CmdResult {
        if !self.model.in_transaction() {
            return Err("no open transaction, use 'begin'".to_string());
        }
        Ok(())
    }

    fn ensure_writable(&self) -> CmdResult {
        if !self.model.is_writable() {
            return Err("model is not writable, use 'begin'".to_string());
        }
        Ok(())
    }

    fn register(&mut self, node: Node) -> String {
        self.next_name += 1;
        let name = format!("n{}", self.next_name);
        self.workspace.insert(name.clone(), node);
        name
    }

    fn take_free(&mut self, name: &str) -> Result<Node, String> {
        let node = self
            .workspace
            .get(name)
            .cloned()
            .ok_or_else(|| format!("no workspace node '{}'", name))?;
        if !node.is_free() {
            return Err(format!("node '{}' is already attached", name));
        }
        self.workspace.remove(name);
        Ok(node)
    }

    fn cmd_new(&mut self, args: &[&str]) -> CmdResult {
        let kind = args.first().ok_or("usage: new <kind> [arg]")?;
        let node = match *kind {
            "bytes" => {
                let text = args.get(1).copied().unwrap_or("");
                BytesNode::with_data(text.as_bytes()).into_node()
            }
            "vector" => VectorNode::new().into_node(),
            "mapping" => MappingNode::new().into_node(),
            "sheet" => SheetNode::new().into_node(),
            "struct" => {
                let arity: usize = args
                    .get(1)
                    .ok_or("usage: new struct <arity>")?
                    .parse()
                    .map_err(|_| "arity must be a number".to_string())?;
                StructNode::new(arity).into_node()
            }
            other => return Err(format!("unknown node kind '{}'", other)),
        };
        let name = self.register(node);
        println!("{}", name);
        Ok(())
    }

    fn cmd_ls(&self) -> CmdResult {
        let mut names: Vec<&String> = self.workspace.keys().collect();
        names.sort();
        for name in names {
            let node = &self.workspace[name];
            let state = if node.is_free() { "free" } else { "attached" };
            println!("{} {:?} ({})", name, node.node_type(), state);
        }
        Ok(())
    }

    fn cmd_setroot(&mut self, args: &[&str]) -> CmdResult {
        self.ensure_writable()?;
        let target = args.first().ok_or("usage: setroot <name|->")?;
        if *target == "-" {
            self.model.set_root(None);
        } else {
            let node = self.take_free(target)?;
            self.model.set_root(Some(node));
        }
        Ok(())
    }

    fn cmd_print(&self, args: &[&str]) -> CmdResult {
        let node = self.resolve(args.first().copied().unwrap_or("/"))?;
        print_node("", &node, 0);
        Ok(())
    }

    fn cmd_bytes(&mut self, parts: &[&str]) -> CmdResult {
        self.ensure_writable()?;
        let args = &parts[1..];
        if args.len() < 2 {
            return Err(format!("usage: {} <path> <index> ...", parts[0]));
        }
        let bytes = self
            .resolve(args[0])?
            .as_bytes()
            .ok_or("path is not a bytes node")?;
        let index: usize = args[1].parse().map_err(|_| "bad index".to_string())?;
        match parts[0] {
            "bins" => {
                let text = args.get(2).ok_or("missing text")?;
                if index > bytes.len() {
                    return Err("index out of range".to_string());
                }
                bytes.insert(index, text.as_bytes());
            }
            "brep" => {
                let text = args.get(2).ok_or("missing text")?;
                if index > bytes.len() {
                    return Err("index out of range".to_string());
                }
                bytes.replace(index, text.as_bytes());
            }
            "brm" => {
                let count: usize = args
                    .get(2)
                    .ok_or("missing count")?
                    .parse()
                    .map_err(|_| "bad count".to_string())?;
                if count == 0 || index >= bytes.len() || count > bytes.len() - index {
                    return Err("range out of bounds".to_string());
                }
                bytes.remove(index, count);
            }
            _ => unreachable!(),
        }
        Ok(())
    }

    fn cmd_vector(&mut self, parts: &[&str]) -> CmdResult {
        self.ensure_writable()?;
        let args = &parts[1..];
        if args.len() < 2 {
            return Err(format!("usage: {} <path> <index> ...", parts[0]));
        }
        let vector = self
            .resolve(args[0])?
            .as_vector()
            .ok_or("path is not a vector node")?;
        let index: usize = args[1].parse().map_err(|_| "bad index".to_string())?;
        match parts[0] {
            "vins" => {
                let name = args.get(2).ok_or("missing node name")?;
                if index > vector.len() {
                    return Err("index out of range".to_string());
                }
                let node = self.take_free(name)?;
                vector.insert(index, vec![node]);
            }
            "vrm" => {
                let count: usize = match args.get(2) {
                    Some(raw) => raw.parse().map_err(|_| "bad count".to_string())?,
                    None => 1,
                };
                if count == 0 || index >= vector.len() || count > vector.len() - index {
                    return Err("range out of bounds".to_string());
                }
                vector.remove(index, count);
            }
            "vmv" => {
                let count: usize = args
                    .get(2)
                    .ok_or("missing count")?
                    .parse()
                    .map_err(|_| "bad count".to_string())?;
                let dest: usize = args
                    .get(3)
                    .ok_or("missing destination")?
                    .parse()
                    .map_err(|_| "bad destination".to_string())?;
                let len = vector.len();
                if count == 0 || index >= len || count > len - index {
                    return Err("range out of bounds".to_string());
                }
                if dest > len || (dest >= index && dest < index + count) {
                    return Err("destination inside the moved range".to_string());
                }
                vector.move_range(index, count, dest);
            }
            _ => unreachable!(),
        }
        Ok(())
    }

    fn cmd_mset(&mut self, args: &[&str]) -> CmdResult {
        self.ensure_writable()?;
        if args.len() < 3 {
            return Err("usage: mset <path> <key> <value>".to_string());
        }
        let mapping = self
            .resolve(args[0])?
            .as_mapping()
            .ok_or("path is not a mapping node")?;
        let value = self.parse_value(args[2])?;
        mapping.set(args[1], value);
        Ok(())
    }

    fn cmd_sheet(&mut self, parts: &[&str]) -> CmdResult {
        self.ensure_writable()?;
        let args = &parts[1..];
        if args.len() < 2 {
            return Err(format!("usage: {} <path> <arg>", parts[0]));
        }
        let sheet = self
            .resolve(args[0])?
            .as_sheet()
            .ok_or("path is not a sheet node")?;
        match parts[0] {
            "sins" => {
                let node = self.take_free(args[1])?;
                let id = sheet.insert(node);
                println!("id {}", id);
            }
            "srm" => {
                let id: u32 = args[1].parse().map_err(|_| "bad id".to_string())?;
                if !sheet.remove(id) {
                    return Err(format!("no row with id {}", id));
                }
            }
            _ => unreachable!(),
        }
        Ok(())
    }

    fn cmd_sset(&mut self, args: &[&str]) -> CmdResult {
        self.ensure_writable()?;
        if args.len() < 3 {
            return Err("usage: sset <path> <index> <value>".to_string());
        }
        let tuple = self
            .resolve(args[0])?
            .as_struct()
            .ok_or("path is not a struct node")?;
        let index: usize = args[1].parse().map_err(|_| "bad index".to_string())?;
        if index >= tuple.arity() {
            return Err("index out of range".to_string());
        }
        let value = self.parse_value(args[2])?;
        tuple.assign(index, value);
        Ok(())
    }

    fn cmd_save(&self, args: &[&str]) -> CmdResult {
        self.ensure_idle()?;
        let file = args.first().ok_or("usage: save <file>")?;
        let root = self.model.root().ok_or("model has no root")?;
        let mut buf = Vec::new();
        {
            let mut writer = StreamWriter::new(&mut buf);
            root.write(&mut writer)
                .map_err(|err| format!("encode failed: {}", err))?;
        }
        fs::write(file, buf).map_err(|err| format!("write failed: {}", err))?;
        Ok(())
    }

    fn cmd_load(&mut self, args: &[&str]) -> CmdResult {
        self.ensure_idle()?;
        let file = args.first().ok_or("usage: load <file>")?;
        let data = fs::read(file).map_err(|err| format!("read failed: {}", err))?;
        let mut cursor = &data[..];
        let mut reader = StreamReader::new(&mut cursor);
        let node = chronicle_model::Node::read(&mut reader)
            .map_err(|err| format!("decode failed: {}", err))?;

        self.model.reset();
        self.model.begin_transaction();
        self.model.set_root(Some(node));
        self.model.commit_transaction(StepMessage::new());
        Ok(())
    }

    /// Parse a value argument: '-' empty, '@name' a workspace node,
    /// typed literals, or a plain string.
    fn parse_value(&mut self, raw: &str) -> Result<Property, String> {
        if raw == "-" {
            return Ok(Property::Empty);
        }
        if let Some(name) = raw.strip_prefix('@') {
            return Ok(Property::Node(self.take_free(name)?));
        }
        let variant = if let Some(number) = raw.strip_prefix("int:") {
            Variant::from(
                number
                    .parse::<i64>()
                    .map_err(|_| "bad integer".to_string())?,
            )
        } else if let Some(number) = raw.strip_prefix("uint:") {
            Variant::from(
                number
                    .parse::<u64>()
                    .map_err(|_| "bad integer".to_string())?,
            )
        } else if let Some(number) = raw.strip_prefix("float:") {
            Variant::from(number.parse::<f64>().map_err(|_| "bad float".to_string())?)
        } else if let Some(flag) = raw.strip_prefix("bool:") {
            Variant::from(flag.parse::<bool>().map_err(|_| "bad bool".to_string())?)
        } else if let Some(text) = raw.strip_prefix("str:") {
            Variant::from(text)
        } else {
            Variant::from(raw)
        };
        Ok(Property::Variant(variant))
    }

    /// Resolve a `/seg/seg` path from the root. Segments index into the
    /// node they land on: position for vectors and structs, key for
    /// mappings, row id for sheets.
    fn resolve(&self, path: &str) -> Result<Node, String> {
        let mut node = self.model.root().ok_or("model has no root")?;
        for segment in path.split('/').filter(|s| !s.is_empty()) {
            node = match node.node_type() {
                NodeType::Vector => {
                    let index: usize =
                        segment.parse().map_err(|_| "bad vector index".to_string())?;
                    node.as_vector()
                        .unwrap()
                        .get(index)
                        .ok_or(format!("no child at index {}", index))?
                }
                NodeType::Mapping => {
                    let prop = node.as_mapping().unwrap().get(segment);
                    match prop {
                        Property::Node(child) => child,
                        Property::Variant(_) => {
                            return Err(format!("'{}' is a variant, not a node", segment))
                        }
                        Property::Empty => return Err(format!("no key '{}'", segment)),
                    }
                }
                NodeType::Sheet => {
                    let id: u32 = segment.parse().map_err(|_| "bad sheet id".to_string())?;
                    node.as_sheet()
                        .unwrap()
                        .get(id)
                        .ok_or(format!("no row with id {}", id))?
                }
                NodeType::Struct => {
                    let index: usize =
                        segment.parse().map_err(|_| "bad struct index".to_string())?;
                    let tuple = node.as_struct().unwrap();
                    if index >= tuple.arity() {
                        return Err("struct index out of range".to_string());
                    }
                    match tuple.get(index) {
                        Property::Node(child) => child,
                        _ => return Err(format!("slot {} holds no node", index)),
                    }
                }
                NodeType::Bytes | NodeType::User(_) => {
                    return Err(format!("cannot descend into {:?}", node.node_type()))
                }
            };
        }
        Ok(node)
    }
}
