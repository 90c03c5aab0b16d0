use design_ir::AnyId;

use super::port_net_holder::{PortNetHolder, PortNetStore};
use crate::file_content::FileContent;
use crate::vobject::NodeId;

/// Named view on the signals of an interface.
#[derive(Debug, Clone)]
pub struct ModPort<'a> {
    parent: String,
    name: String,
    file_content: &'a FileContent,
    node: NodeId,
    ir: Option<AnyId>,
    store: PortNetStore<'a>,
}

impl<'a> ModPort<'a> {
    pub fn new(parent: &str, name: &str, file_content: &'a FileContent, node: NodeId) -> Self {
        Self {
            parent: parent.to_string(),
            name: name.to_string(),
            file_content,
            node,
            ir: None,
            store: PortNetStore::default(),
        }
    }

    /// Name of the interface definition the modport belongs to.
    pub fn parent(&self) -> &str {
        &self.parent
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn file_content(&self) -> &'a FileContent {
        self.file_content
    }

    pub fn node(&self) -> NodeId {
        self.node
    }

    pub fn ir(&self) -> Option<AnyId> {
        self.ir
    }

    pub fn set_ir(&mut self, ir: AnyId) {
        self.ir = Some(ir);
    }
}

impl PartialEq for ModPort<'_> {
    fn eq(&self, other: &Self) -> bool {
        self.parent == other.parent
            && self.name == other.name
            && self.file_content.file_id() == other.file_content.file_id()
            && self.node == other.node
    }
}

impl Eq for ModPort<'_> {}

impl<'a> PortNetHolder<'a> for ModPort<'a> {
    fn port_nets(&self) -> &PortNetStore<'a> {
        &self.store
    }

    fn port_nets_mut(&mut self) -> &mut PortNetStore<'a> {
        &mut self.store
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::design::signal::Signal;
    use crate::symbols::{SymbolId, SymbolTable};
    use crate::vobject::{VObject, VObjectType};

    fn content() -> (FileContent, NodeId, NodeId) {
        let symbols = Arc::new(SymbolTable::new());
        let file = symbols.register_path("bus.sv");
        let name = symbols.register("a");
        let mut fc = FileContent::new(file, "work", Arc::clone(&symbols));
        let item = fc.add_object(VObject::new(
            SymbolId::BAD,
            VObjectType::PaModportItem,
            file,
            NodeId::INVALID,
        ));
        let port = fc.add_object(VObject::new(name, VObjectType::SlStringConst, file, item));
        fc.append_child(item, port);
        (fc, item, port)
    }

    #[test]
    fn identity_is_parent_name_file_and_node() {
        let (fc, item, _) = content();
        let a = ModPort::new("work@bus", "mp", &fc, item);
        let b = ModPort::new("work@bus", "mp", &fc, item);
        let c = ModPort::new("work@bus", "other", &fc, item);
        assert_eq!(a, b);
        assert_ne!(a, c);
    }

    #[test]
    fn removing_a_port_keeps_order() {
        let (fc, item, port) = content();
        let mut mp = ModPort::new("work@bus", "mp", &fc, item);
        let make = || {
            Signal::new(
                "work@bus",
                &fc,
                port,
                port,
                VObjectType::SlNoType,
                VObjectType::PaPortDirInp,
            )
        };
        let (first, second, third) = (make(), make(), make());
        let ids = [first.inst_id(), second.inst_id(), third.inst_id()];
        mp.add_port(first);
        mp.add_port(second);
        mp.add_port(third);

        let removed = mp.remove_port(ids[1]).unwrap();
        assert_eq!(removed.inst_id(), ids[1]);
        let left: Vec<u64> = mp.ports().iter().map(Signal::inst_id).collect();
        assert_eq!(left, vec![ids[0], ids[2]]);
        assert!(mp.remove_port(ids[1]).is_none());
        assert_eq!(mp.port("a").map(Signal::inst_id), Some(ids[0]));
    }
}
