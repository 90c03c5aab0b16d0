use design_ir::{AnyId, Serializer};
use indexmap::IndexMap;
use log::trace;

use super::modport::ModPort;
use super::port_net_holder::{PortNetHolder, PortNetStore};
use super::signal::Signal;
use crate::file_content::FileContent;
use crate::vobject::{NodeId, VObjectType};

/// What a definition describes, decided by the type of its first root.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ModuleKind {
    Module,
    Interface,
    Udp,
    /// No file content: built-in gates and placeholders.
    Unknown,
}

/// A clocking block named in a modport.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClockingBlock {
    pub name: String,
    pub node: NodeId,
}

impl ClockingBlock {
    pub fn new(name: impl Into<String>, node: NodeId) -> Self {
        Self {
            name: name.into(),
            node,
        }
    }
}

/// Definition of a module, interface or UDP, with its IR instance.
#[derive(Debug, Clone)]
pub struct ModuleDefinition<'a> {
    name: String,
    file_contents: Vec<(&'a FileContent, NodeId)>,
    ir: AnyId,
    mod_ports: IndexMap<String, ModPort<'a>>,
    mod_port_clocking_blocks: IndexMap<String, Vec<ClockingBlock>>,
    class_definitions: IndexMap<String, NodeId>,
    store: PortNetStore<'a>,
}

impl<'a> ModuleDefinition<'a> {
    pub fn new(
        name: &str,
        file_content: &'a FileContent,
        root: NodeId,
        serializer: &mut Serializer,
    ) -> Self {
        let fc = file_content;
        let ir = match fc.vtype(root) {
            VObjectType::PaUdpDeclaration => {
                let ir = serializer.make_udp_defn();
                if !name.is_empty() {
                    serializer.set_vpi_def_name(ir, name);
                }
                fc.populate_core_members(
                    fc.sl_collect(root, VObjectType::PaPrimitive),
                    root,
                    serializer,
                    ir,
                );
                ir
            }
            VObjectType::PaInterfaceDeclaration => {
                let ir = serializer.make_interface_inst();
                if !name.is_empty() {
                    serializer.set_vpi_name(ir, name);
                }
                fc.populate_core_members(
                    fc.sl_collect(root, VObjectType::PaInterface),
                    root,
                    serializer,
                    ir,
                );
                ir
            }
            _ => {
                let ir = serializer.make_module_inst();
                if !name.is_empty() {
                    serializer.set_vpi_name(ir, name);
                }
                fc.populate_core_members(
                    fc.sl_collect(root, VObjectType::PaModuleKeyword),
                    root,
                    serializer,
                    ir,
                );
                ir
            }
        };
        trace!("definition {name} -> {}", serializer.kind(ir).name());
        Self {
            name: name.to_string(),
            file_contents: vec![(file_content, root)],
            ir,
            mod_ports: IndexMap::new(),
            mod_port_clocking_blocks: IndexMap::new(),
            class_definitions: IndexMap::new(),
            store: PortNetStore::default(),
        }
    }

    /// Definition without source, such as a built-in gate.
    pub fn builtin(name: &str, serializer: &mut Serializer) -> Self {
        let ir = serializer.make_module_inst();
        serializer.set_vpi_def_name(ir, name);
        Self {
            name: name.to_string(),
            file_contents: Vec::new(),
            ir,
            mod_ports: IndexMap::new(),
            mod_port_clocking_blocks: IndexMap::new(),
            class_definitions: IndexMap::new(),
            store: PortNetStore::default(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn ir(&self) -> AnyId {
        self.ir
    }

    pub fn file_contents(&self) -> &[(&'a FileContent, NodeId)] {
        &self.file_contents
    }

    pub fn add_file_content(&mut self, file_content: &'a FileContent, root: NodeId) {
        self.file_contents.push((file_content, root));
    }

    pub fn kind(&self) -> ModuleKind {
        let Some((fc, root)) = self.file_contents.first() else {
            return ModuleKind::Unknown;
        };
        match fc.vtype(*root) {
            VObjectType::PaUdpDeclaration => ModuleKind::Udp,
            VObjectType::PaInterfaceDeclaration => ModuleKind::Interface,
            _ => ModuleKind::Module,
        }
    }

    /// Modules, UDPs and gates get instantiated; interfaces do not.
    pub fn is_instance(&self) -> bool {
        matches!(
            self.kind(),
            ModuleKind::Module | ModuleKind::Udp | ModuleKind::Unknown
        )
    }

    /// Number of nodes below the roots.
    pub fn size(&self) -> usize {
        self.file_contents
            .iter()
            .map(|(fc, root)| fc.preorder(*root).count().saturating_sub(1))
            .sum()
    }

    /// Adds `signal` to the modport `modport`, creating the modport (and its
    /// IR object) the first time the name is seen.
    pub fn insert_mod_port(
        &mut self,
        modport: &str,
        signal: Signal<'a>,
        node: NodeId,
        serializer: &mut Serializer,
    ) {
        if !self.mod_ports.contains_key(modport) {
            let Some((fc, _)) = self.file_contents.first().copied() else {
                return;
            };
            let mut entry = ModPort::new(&self.name, modport, fc, node);
            let ir = serializer.make_modport();
            serializer.set_vpi_name(ir, modport);
            serializer.set_vpi_parent(ir, self.ir);
            fc.populate_core_members(node, node, serializer, ir);
            entry.set_ir(ir);
            self.mod_ports.insert(modport.to_string(), entry);
        }
        if let Some(entry) = self.mod_ports.get_mut(modport) {
            entry.add_port(signal);
        }
    }

    pub fn mod_port(&self, modport: &str) -> Option<&ModPort<'a>> {
        self.mod_ports.get(modport)
    }

    pub fn mod_ports(&self) -> impl Iterator<Item = &ModPort<'a>> {
        self.mod_ports.values()
    }

    /// Port of `modport` declared at `port`.
    pub fn mod_port_signal(&self, modport: &str, port: NodeId) -> Option<&Signal<'a>> {
        self.mod_ports
            .get(modport)?
            .ports()
            .iter()
            .find(|signal| signal.node() == port)
    }

    pub fn insert_mod_port_clocking_block(&mut self, modport: &str, block: ClockingBlock) {
        self.mod_port_clocking_blocks
            .entry(modport.to_string())
            .or_default()
            .push(block);
    }

    pub fn mod_port_clocking_block(&self, modport: &str, port: NodeId) -> Option<&ClockingBlock> {
        self.mod_port_clocking_blocks
            .get(modport)?
            .iter()
            .find(|block| block.node == port)
    }

    pub fn mod_port_clocking_blocks(&self, modport: &str) -> &[ClockingBlock] {
        self.mod_port_clocking_blocks
            .get(modport)
            .map_or(&[], Vec::as_slice)
    }

    pub fn add_class_definition(&mut self, name: &str, node: NodeId) {
        self.class_definitions.insert(name.to_string(), node);
    }

    pub fn class_definition(&self, name: &str) -> Option<NodeId> {
        self.class_definitions.get(name).copied()
    }

    pub fn class_definitions(&self) -> impl Iterator<Item = (&str, NodeId)> {
        self.class_definitions
            .iter()
            .map(|(name, node)| (name.as_str(), *node))
    }
}

impl<'a> PortNetHolder<'a> for ModuleDefinition<'a> {
    fn port_nets(&self) -> &PortNetStore<'a> {
        &self.store
    }

    fn port_nets_mut(&mut self) -> &mut PortNetStore<'a> {
        &mut self.store
    }
}
