use design_ir::AnyVecId;

use super::signal::Signal;

/// IR collections a component refers to without owning them. The vectors
/// live in the serializer; a component only keeps the handle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HandleKind {
    ContAssigns,
    Processes,
    Parameters,
    Assertions,
    ParamAssigns,
    OrigParamAssigns,
    TaskFuncs,
    TaskFuncDecls,
}

impl HandleKind {
    pub const ALL: [HandleKind; 8] = [
        HandleKind::ContAssigns,
        HandleKind::Processes,
        HandleKind::Parameters,
        HandleKind::Assertions,
        HandleKind::ParamAssigns,
        HandleKind::OrigParamAssigns,
        HandleKind::TaskFuncs,
        HandleKind::TaskFuncDecls,
    ];

    fn slot(self) -> usize {
        self as usize
    }
}

/// Storage behind [`PortNetHolder`].
#[derive(Debug, Clone, Default)]
pub struct PortNetStore<'a> {
    ports: Vec<Signal<'a>>,
    signals: Vec<Signal<'a>>,
    handles: [Option<AnyVecId>; 8],
}

/// Anything that owns ports and nets: module definitions and modports.
pub trait PortNetHolder<'a> {
    fn port_nets(&self) -> &PortNetStore<'a>;
    fn port_nets_mut(&mut self) -> &mut PortNetStore<'a>;

    fn ports(&self) -> &[Signal<'a>] {
        &self.port_nets().ports
    }

    fn ports_mut(&mut self) -> &mut Vec<Signal<'a>> {
        &mut self.port_nets_mut().ports
    }

    fn add_port(&mut self, signal: Signal<'a>) {
        self.port_nets_mut().ports.push(signal);
    }

    /// Removes the port with instance id `inst_id`; the others keep their
    /// order.
    fn remove_port(&mut self, inst_id: u64) -> Option<Signal<'a>> {
        let ports = &mut self.port_nets_mut().ports;
        let index = ports.iter().position(|s| s.inst_id() == inst_id)?;
        Some(ports.remove(index))
    }

    fn port(&self, name: &str) -> Option<&Signal<'a>> {
        self.ports().iter().find(|s| s.name() == name)
    }

    fn signals(&self) -> &[Signal<'a>] {
        &self.port_nets().signals
    }

    fn add_signal(&mut self, signal: Signal<'a>) {
        self.port_nets_mut().signals.push(signal);
    }

    fn remove_signal(&mut self, inst_id: u64) -> Option<Signal<'a>> {
        let signals = &mut self.port_nets_mut().signals;
        let index = signals.iter().position(|s| s.inst_id() == inst_id)?;
        Some(signals.remove(index))
    }

    fn signal(&self, name: &str) -> Option<&Signal<'a>> {
        self.signals().iter().find(|s| s.name() == name)
    }

    fn handle(&self, kind: HandleKind) -> Option<AnyVecId> {
        self.port_nets().handles[kind.slot()]
    }

    fn set_handle(&mut self, kind: HandleKind, vec: AnyVecId) {
        self.port_nets_mut().handles[kind.slot()] = Some(vec);
    }

    fn cont_assigns(&self) -> Option<AnyVecId> {
        self.handle(HandleKind::ContAssigns)
    }

    fn processes(&self) -> Option<AnyVecId> {
        self.handle(HandleKind::Processes)
    }

    fn parameters(&self) -> Option<AnyVecId> {
        self.handle(HandleKind::Parameters)
    }

    fn assertions(&self) -> Option<AnyVecId> {
        self.handle(HandleKind::Assertions)
    }

    fn param_assigns(&self) -> Option<AnyVecId> {
        self.handle(HandleKind::ParamAssigns)
    }

    fn orig_param_assigns(&self) -> Option<AnyVecId> {
        self.handle(HandleKind::OrigParamAssigns)
    }

    fn task_funcs(&self) -> Option<AnyVecId> {
        self.handle(HandleKind::TaskFuncs)
    }

    fn task_func_decls(&self) -> Option<AnyVecId> {
        self.handle(HandleKind::TaskFuncDecls)
    }
}
