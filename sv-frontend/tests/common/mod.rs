use std::path::Path;

use design_ir::{AnyId, ObjectKind, Serializer};
use sv_frontend::{
    compile_design, Config, FileContent, NodeId, ParsedFile, Session, SystemVerilogParser,
    VObjectType,
};

pub struct TestHarness {
    session: Session,
    parser: SystemVerilogParser,
}

impl TestHarness {
    pub fn new() -> Self {
        Self::with_config(Config::default())
    }

    pub fn with_config(config: Config) -> Self {
        let parser = SystemVerilogParser::from_config(&config);
        Self {
            session: Session::new(config),
            parser,
        }
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn parse(&mut self, source: &str) -> ParsedFile {
        self.parse_named(source, "test.sv")
    }

    pub fn parse_named(&mut self, source: &str, name: &str) -> ParsedFile {
        self.parser
            .parse_content(&self.session, source, Path::new(name))
            .unwrap_or_else(|err| panic!("failed to parse {name}: {err}"))
    }

    #[allow(dead_code)]
    pub fn try_parse(&mut self, source: &str) -> sv_frontend::Result<ParsedFile> {
        self.parser
            .parse_content(&self.session, source, Path::new("test.sv"))
    }

    /// Parses `source` and compiles it into a fresh serializer.
    #[allow(dead_code)]
    pub fn compile(&mut self, source: &str) -> (Vec<ParsedFile>, Serializer) {
        let files = vec![self.parse(source)];
        let mut serializer = Serializer::new();
        compile_design(&self.session, &files, &mut serializer)
            .unwrap_or_else(|err| panic!("failed to compile: {err}"));
        (files, serializer)
    }

    #[allow(dead_code)]
    pub fn has_diagnostic(&self, code: &str) -> bool {
        self.session.errors().contains(code)
    }
}

impl Default for TestHarness {
    fn default() -> Self {
        Self::new()
    }
}

/// Names of the design elements of `fc`, in discovery order.
#[allow(dead_code)]
pub fn element_names(fc: &FileContent) -> Vec<String> {
    fc.design_elements()
        .iter()
        .map(|e| fc.design_element_name(e).to_string())
        .collect()
}

/// All nodes of type `vtype` in the file, pre-order.
#[allow(dead_code)]
pub fn nodes_of(fc: &FileContent, vtype: VObjectType) -> Vec<NodeId> {
    fc.sl_collect_all(fc.root(), vtype)
}

/// IR objects of `kind`, in creation order.
#[allow(dead_code)]
pub fn ir_objects(s: &Serializer, kind: ObjectKind) -> Vec<AnyId> {
    s.objects()
        .filter(|(_, object)| object.kind == kind)
        .map(|(id, _)| id)
        .collect()
}

/// Statements of a `begin`.
#[allow(dead_code)]
pub fn stmts(s: &Serializer, begin: AnyId) -> Vec<AnyId> {
    s.object(begin)
        .stmts
        .map(|v| s.vec(v).to_vec())
        .unwrap_or_default()
}
