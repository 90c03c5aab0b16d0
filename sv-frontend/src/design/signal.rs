use std::sync::atomic::{AtomicU64, Ordering};

use crate::file_content::FileContent;
use crate::vobject::{NodeId, VObjectType};

static NEXT_INSTANCE_ID: AtomicU64 = AtomicU64::new(1);

/// A port, net or variable of a design component. Node ids point into the
/// file content the signal was declared in.
#[derive(Debug, Clone)]
pub struct Signal<'a> {
    inst_id: u64,
    component: String,
    file_content: &'a FileContent,
    node: NodeId,
    name_node: NodeId,
    net_node: NodeId,
    net_name_node: NodeId,
    interface_type_name_node: NodeId,
    packed_dimension: NodeId,
    unpacked_dimension: NodeId,
    subnet_type: VObjectType,
    direction: VObjectType,
    signed: bool,
}

impl<'a> Signal<'a> {
    /// Net, variable or port signal.
    pub fn new(
        component: &str,
        file_content: &'a FileContent,
        node: NodeId,
        name_node: NodeId,
        subnet_type: VObjectType,
        direction: VObjectType,
    ) -> Self {
        Self {
            inst_id: NEXT_INSTANCE_ID.fetch_add(1, Ordering::Relaxed),
            component: component.to_string(),
            file_content,
            node,
            name_node,
            net_node: node,
            net_name_node: name_node,
            interface_type_name_node: NodeId::INVALID,
            packed_dimension: NodeId::INVALID,
            unpacked_dimension: NodeId::INVALID,
            subnet_type,
            direction,
            signed: false,
        }
    }

    /// Signal typed by an interface (optionally through a modport) or by a
    /// package-scoped type. It has no direction.
    pub fn interface(
        component: &str,
        file_content: &'a FileContent,
        node: NodeId,
        name_node: NodeId,
        interface_type_name_node: NodeId,
    ) -> Self {
        let mut signal = Self::new(
            component,
            file_content,
            node,
            name_node,
            VObjectType::SlNoType,
            VObjectType::SlNoType,
        );
        signal.interface_type_name_node = interface_type_name_node;
        signal
    }

    pub fn with_packed_dimension(mut self, node: NodeId) -> Self {
        self.packed_dimension = node;
        self
    }

    pub fn with_unpacked_dimension(mut self, node: NodeId) -> Self {
        self.unpacked_dimension = node;
        self
    }

    pub fn with_signed(mut self, signed: bool) -> Self {
        self.signed = signed;
        self
    }

    pub fn inst_id(&self) -> u64 {
        self.inst_id
    }

    pub fn component(&self) -> &str {
        &self.component
    }

    pub fn file_content(&self) -> &'a FileContent {
        self.file_content
    }

    pub fn node(&self) -> NodeId {
        self.node
    }

    pub fn name_node(&self) -> NodeId {
        self.name_node
    }

    pub fn name(&self) -> &'a str {
        self.file_content.sym_name(self.name_node)
    }

    pub fn net_node(&self) -> NodeId {
        self.net_node
    }

    pub fn net_name(&self) -> &'a str {
        self.file_content.sym_name(self.net_name_node)
    }

    /// Points the signal at the net it connects to, when the port and the
    /// net are declared separately.
    pub fn set_net(&mut self, node: NodeId, name_node: NodeId) {
        self.net_node = node;
        self.net_name_node = name_node;
    }

    pub fn interface_type_name_node(&self) -> NodeId {
        self.interface_type_name_node
    }

    pub fn is_interface(&self) -> bool {
        self.interface_type_name_node.is_valid()
    }

    /// `iface.modport` selector of an interface port.
    pub fn mod_port_node(&self) -> NodeId {
        if !self.is_interface() {
            return NodeId::INVALID;
        }
        let select = self.file_content.sibling(self.interface_type_name_node);
        if self.file_content.vtype(select) == VObjectType::SlStringConst {
            select
        } else {
            NodeId::INVALID
        }
    }

    pub fn packed_dimension(&self) -> NodeId {
        self.packed_dimension
    }

    pub fn unpacked_dimension(&self) -> NodeId {
        self.unpacked_dimension
    }

    pub fn subnet_type(&self) -> VObjectType {
        self.subnet_type
    }

    pub fn set_subnet_type(&mut self, subnet_type: VObjectType) {
        self.subnet_type = subnet_type;
    }

    pub fn direction(&self) -> VObjectType {
        self.direction
    }

    pub fn set_direction(&mut self, direction: VObjectType) {
        self.direction = direction;
    }

    pub fn is_signed(&self) -> bool {
        self.signed
    }

    pub fn set_signed(&mut self, signed: bool) {
        self.signed = signed;
    }

    /// Rebuilds the type name of an interface-typed signal: `pkg::type` for
    /// a class scope, `iface` or `iface.modport` otherwise.
    pub fn interface_type_name(&self) -> String {
        let fc = self.file_content;
        let id = self.interface_type_name_node;
        if !id.is_valid() {
            return String::new();
        }
        if fc.vtype(id) == VObjectType::PaClassScope {
            let package = fc.child(fc.child(id));
            let type_name = fc.sibling(id);
            return format!("{}::{}", fc.sym_name(package), fc.sym_name(type_name));
        }

        let mut name = fc.sym_name(id).to_string();
        let select = fc.sibling(id);
        if select.is_valid() {
            let modport = if fc.vtype(select) == VObjectType::SlStringConst {
                select
            } else {
                fc.child(select)
            };
            if modport.is_valid() && fc.vtype(modport) == VObjectType::SlStringConst {
                name.push('.');
                name.push_str(fc.sym_name(modport));
            }
        }
        name
    }
}
