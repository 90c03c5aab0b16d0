use design_ir::{AnyId, AnyVecId, Serializer};
use indexmap::IndexMap;
use log::{debug, info};

use super::{shape_children, CompileHelper};
use crate::design::{ClockingBlock, HandleKind, ModuleDefinition, PortNetHolder, Signal};
use crate::error::{Diagnostic, ErrorKind, Result};
use crate::file_content::{DesignElementKind, FileContent};
use crate::parser::ParsedFile;
use crate::session::Session;
use crate::vobject::{NodeId, VObjectType};

/// Components of all compiled files, keyed by `library@name`.
#[derive(Debug, Default)]
pub struct Design<'a> {
    definitions: IndexMap<String, ModuleDefinition<'a>>,
    packages: IndexMap<String, (&'a FileContent, NodeId)>,
    programs: IndexMap<String, (&'a FileContent, NodeId)>,
    classes: IndexMap<String, (&'a FileContent, NodeId)>,
    precompiled: Vec<String>,
}

impl<'a> Design<'a> {
    pub fn definition(&self, name: &str) -> Option<&ModuleDefinition<'a>> {
        self.definitions.get(name)
    }

    pub fn definitions(&self) -> impl Iterator<Item = &ModuleDefinition<'a>> {
        self.definitions.values()
    }

    pub fn package(&self, name: &str) -> Option<(&'a FileContent, NodeId)> {
        self.packages.get(name).copied()
    }

    pub fn packages(&self) -> impl Iterator<Item = &str> {
        self.packages.keys().map(String::as_str)
    }

    pub fn program(&self, name: &str) -> Option<(&'a FileContent, NodeId)> {
        self.programs.get(name).copied()
    }

    pub fn class(&self, name: &str) -> Option<(&'a FileContent, NodeId)> {
        self.classes.get(name).copied()
    }

    /// Whether the package `name` was read from a precompiled package file.
    pub fn is_precompiled(&self, name: &str) -> bool {
        self.precompiled.iter().any(|p| p == name)
    }
}

/// Builds a [`ModuleDefinition`] for every module, interface and UDP of
/// `files`, collects their ports, signals and modports, and lowers their
/// continuous assignments and generate constructs.
pub fn compile_design<'a>(
    session: &Session,
    files: &'a [ParsedFile],
    s: &mut Serializer,
) -> Result<Design<'a>> {
    let helper = CompileHelper::new(session);
    let mut design = Design::default();

    for file in files {
        let fc = &file.file_content;
        for element in fc.design_elements() {
            let name = fc.design_element_name(element);
            match element.kind {
                DesignElementKind::Module
                | DesignElementKind::Interface
                | DesignElementKind::Primitive => {
                    if design.definitions.contains_key(name) {
                        helper.report(
                            fc,
                            element.node,
                            Diagnostic::new(
                                format!("{name} is already defined, keeping the first definition"),
                                ErrorKind::CompDuplicateDefinition(name.to_string()),
                            ),
                        )?;
                        continue;
                    }
                    let definition = compile_definition(&helper, name, fc, element.node, s)?;
                    for gate in gate_types(fc, element.node) {
                        design
                            .definitions
                            .entry(gate.to_string())
                            .or_insert_with(|| ModuleDefinition::builtin(gate, s));
                    }
                    design.definitions.insert(name.to_string(), definition);
                }
                DesignElementKind::Package => {
                    let short = name.rsplit('@').next().unwrap_or(name);
                    let precompiled = session.precompiled();
                    if precompiled.is_package_precompiled(short)
                        && precompiled.is_file_id_precompiled(fc.file_of(element.node), session.symbols())
                    {
                        debug!("{name} comes from {}", precompiled.file_name(short));
                        design.precompiled.push(name.to_string());
                    }
                    design.packages.insert(name.to_string(), (fc, element.node));
                }
                DesignElementKind::Program => {
                    design.programs.insert(name.to_string(), (fc, element.node));
                }
                DesignElementKind::Class => {
                    design.classes.insert(name.to_string(), (fc, element.node));
                    let owner = element
                        .parent
                        .and_then(|index| fc.design_elements().get(index))
                        .map(|parent| fc.design_element_name(parent));
                    if let Some(owner) = owner.and_then(|o| design.definitions.get_mut(o)) {
                        let short = name.rsplit(['.', '@']).next().unwrap_or(name);
                        owner.add_class_definition(short, element.node);
                    }
                }
                _ => {}
            }
        }
    }
    info!(
        "compiled {} definitions, {} packages",
        design.definitions.len(),
        design.packages.len()
    );
    Ok(design)
}

fn compile_definition<'a>(
    helper: &CompileHelper<'_>,
    name: &str,
    fc: &'a FileContent,
    root: NodeId,
    s: &mut Serializer,
) -> Result<ModuleDefinition<'a>> {
    let mut definition = ModuleDefinition::new(name, fc, root, s);
    collect_ports(&mut definition, fc, root);
    collect_signals(&mut definition, fc, root);
    collect_mod_ports(&mut definition, fc, root, s);
    debug!(
        "{name}: {} ports, {} signals, {} modports",
        definition.ports().len(),
        definition.signals().len(),
        definition.mod_ports().count()
    );

    let items = shape_children(fc, root);
    let mut assigns = Vec::new();
    for item in items
        .iter()
        .copied()
        .filter(|i| fc.vtype(*i) == VObjectType::PaContinuousAssign)
    {
        assigns.extend(helper.compile_cont_assigns(fc, item, definition.ir(), s));
    }
    if !assigns.is_empty() {
        let vec = any_vec(s, assigns);
        definition.set_handle(HandleKind::ContAssigns, vec);
    }

    let mut gen_stmts = Vec::new();
    for item in items.iter().copied().filter(|i| {
        matches!(
            fc.vtype(*i),
            VObjectType::PaGenerateRegion
                | VObjectType::PaConditionalGenerateConstruct
                | VObjectType::PaLoopGenerateConstruct
        )
    }) {
        gen_stmts.extend(helper.compile_gen_stmt(&definition, fc, item, s)?);
    }
    if !gen_stmts.is_empty() {
        let vec = any_vec(s, gen_stmts);
        s.set_gen_stmts(definition.ir(), vec);
    }
    Ok(definition)
}

fn any_vec(s: &mut Serializer, items: Vec<AnyId>) -> AnyVecId {
    let vec = s.make_any_vec();
    for item in items {
        s.push(vec, item);
    }
    vec
}

fn is_direction(vtype: VObjectType) -> bool {
    matches!(
        vtype,
        VObjectType::PaPortDirInp
            | VObjectType::PaPortDirOut
            | VObjectType::PaPortDirInout
            | VObjectType::PaPortDirRef
    )
}

fn is_net_type(vtype: VObjectType) -> bool {
    matches!(
        vtype,
        VObjectType::PaNetTypeWire
            | VObjectType::PaNetTypeUwire
            | VObjectType::PaNetTypeTri
            | VObjectType::PaNetTypeWand
            | VObjectType::PaNetTypeWor
            | VObjectType::PaNetTypeSupply0
            | VObjectType::PaNetTypeSupply1
    )
}

/// Signal named `name`, typed by the declaration `type_owner` and
/// dimensioned by `node`.
fn declared_signal<'a>(
    component: &str,
    fc: &'a FileContent,
    type_owner: NodeId,
    node: NodeId,
    name: NodeId,
    direction: VObjectType,
) -> Signal<'a> {
    let data_type = fc.sl_get(type_owner, VObjectType::PaDataType);
    let type_node = fc.child(data_type);
    let signed = fc
        .children(type_owner)
        .chain(fc.children(data_type))
        .any(|k| fc.vtype(k) == VObjectType::PaSigningSigned);
    let unpacked = fc.sl_get(node, VObjectType::PaUnpackedDimension);

    if data_type.is_valid()
        && matches!(
            fc.vtype(type_node),
            VObjectType::SlStringConst | VObjectType::PaClassScope
        )
    {
        let mut signal = Signal::interface(component, fc, node, name, type_node)
            .with_unpacked_dimension(unpacked);
        signal.set_direction(direction);
        return signal;
    }

    let subnet_type = if data_type.is_valid() {
        fc.vtype(type_node)
    } else {
        fc.children(type_owner)
            .map(|k| fc.vtype(k))
            .find(|v| is_net_type(*v))
            .unwrap_or(VObjectType::SlNoType)
    };
    let packed = if data_type.is_valid() {
        fc.sl_get(data_type, VObjectType::PaPackedDimension)
    } else {
        fc.sl_get(type_owner, VObjectType::PaPackedDimension)
    };
    Signal::new(component, fc, node, name, subnet_type, direction)
        .with_packed_dimension(packed)
        .with_unpacked_dimension(unpacked)
        .with_signed(signed)
}

fn collect_ports<'a>(definition: &mut ModuleDefinition<'a>, fc: &'a FileContent, root: NodeId) {
    let component = definition.name().to_string();

    let ansi = fc.sl_get(root, VObjectType::PaListOfPortDeclarations);
    // A port without a direction keeps the previous one.
    let mut direction = VObjectType::PaPortDirInout;
    for decl in fc.sl_get_all(ansi, VObjectType::PaAnsiPortDeclaration) {
        let name = fc.sl_get(decl, VObjectType::SlStringConst);
        let header = fc.sl_get(decl, VObjectType::PaInterfacePortHeader);
        let signal = if header.is_valid() {
            Signal::interface(&component, fc, decl, name, fc.child(header))
                .with_unpacked_dimension(fc.sl_get(decl, VObjectType::PaUnpackedDimension))
        } else {
            if let Some(dir) = fc.children(decl).map(|k| fc.vtype(k)).find(|v| is_direction(*v)) {
                direction = dir;
            }
            declared_signal(&component, fc, decl, decl, name, direction)
        };
        definition.add_port(signal);
    }

    let non_ansi = fc.sl_get(root, VObjectType::PaListOfPorts);
    for port in fc.sl_get_all(non_ansi, VObjectType::PaPort) {
        let name = fc.sl_get(port, VObjectType::SlStringConst);
        definition.add_port(Signal::new(
            &component,
            fc,
            port,
            name,
            VObjectType::SlNoType,
            VObjectType::SlNoType,
        ));
    }

    // Body declarations give non-ANSI ports their direction and type.
    for item in fc.sl_get_all(root, VObjectType::PaPortDeclaration) {
        let Some(decl) = shape_children(fc, item).first().copied() else {
            continue;
        };
        let direction = match fc.vtype(decl) {
            VObjectType::PaInputDeclaration => VObjectType::PaPortDirInp,
            VObjectType::PaOutputDeclaration => VObjectType::PaPortDirOut,
            _ => VObjectType::PaPortDirInout,
        };
        let ids = fc.sl_get(decl, VObjectType::PaListOfPortIdentifiers);
        for name in fc.sl_get_all(ids, VObjectType::SlStringConst) {
            let declared = declared_signal(&component, fc, decl, ids, name, direction);
            let port_name = fc.sym_name(name);
            match definition.ports_mut().iter_mut().find(|p| p.name() == port_name) {
                Some(port) => {
                    port.set_direction(direction);
                    port.set_subnet_type(declared.subnet_type());
                    port.set_signed(declared.is_signed());
                    port.set_net(decl, name);
                }
                None => definition.add_port(declared),
            }
        }
    }
}

fn collect_signals<'a>(definition: &mut ModuleDefinition<'a>, fc: &'a FileContent, root: NodeId) {
    let component = definition.name().to_string();
    for item in shape_children(fc, root) {
        let decl_type = match fc.vtype(item) {
            VObjectType::PaNetDeclaration => VObjectType::PaNetDeclAssignment,
            VObjectType::PaDataDeclaration => VObjectType::PaVariableDeclAssignment,
            _ => continue,
        };
        for decl in fc.sl_get_all(item, decl_type) {
            let name = fc.sl_get(decl, VObjectType::SlStringConst);
            let signal =
                declared_signal(&component, fc, item, decl, name, VObjectType::SlNoType);
            definition.add_signal(signal);
        }
    }
}

fn collect_mod_ports<'a>(
    definition: &mut ModuleDefinition<'a>,
    fc: &'a FileContent,
    root: NodeId,
    s: &mut Serializer,
) {
    let component = definition.name().to_string();
    for decl in fc.sl_get_all(root, VObjectType::PaModportDeclaration) {
        for item in fc.sl_get_all(decl, VObjectType::PaModportItem) {
            let modport = fc.sym_name(fc.sl_get(item, VObjectType::SlStringConst));
            let mut direction = VObjectType::SlNoType;
            for ports in fc.sl_get_all(item, VObjectType::PaModportPortsDeclaration) {
                let Some(group) = shape_children(fc, ports).first().copied() else {
                    continue;
                };
                match fc.vtype(group) {
                    VObjectType::PaModportSimplePortsDeclaration => {
                        for part in shape_children(fc, group) {
                            let vtype = fc.vtype(part);
                            if is_direction(vtype) {
                                direction = vtype;
                            } else if vtype == VObjectType::PaModportSimplePort {
                                let name = fc.sl_get(part, VObjectType::SlStringConst);
                                let signal = Signal::new(
                                    &component,
                                    fc,
                                    part,
                                    name,
                                    VObjectType::SlNoType,
                                    direction,
                                );
                                definition.insert_mod_port(modport, signal, item, s);
                            }
                        }
                    }
                    VObjectType::PaModportClockingDeclaration => {
                        let name = fc.sym_name(fc.sl_get(group, VObjectType::SlStringConst));
                        definition
                            .insert_mod_port_clocking_block(modport, ClockingBlock::new(name, group));
                    }
                    _ => {}
                }
            }
        }
    }
}

/// Built-in gate primitives instantiated under `root`.
fn gate_types(fc: &FileContent, root: NodeId) -> Vec<&'static str> {
    let mut gates = Vec::new();
    for instantiation in fc.sl_collect_all(root, VObjectType::PaGateInstantiation) {
        let gate = match shape_children(fc, instantiation).first().map(|g| fc.vtype(*g)) {
            Some(VObjectType::PaNInpGateAnd) => "and",
            Some(VObjectType::PaNInpGateNand) => "nand",
            Some(VObjectType::PaNInpGateOr) => "or",
            Some(VObjectType::PaNInpGateNor) => "nor",
            Some(VObjectType::PaNInpGateXor) => "xor",
            Some(VObjectType::PaNInpGateXnor) => "xnor",
            _ => continue,
        };
        if !gates.contains(&gate) {
            gates.push(gate);
        }
    }
    gates
}
