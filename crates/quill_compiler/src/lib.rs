//! quill_compiler: Compilation orchestration.
//!
//! Owns the options, the shared type table and the host globals, and
//! coordinates parsing and binding across all source files.

mod options;
mod semantic_model;

use std::sync::Arc;

use indexmap::IndexMap;
use quill_binder::{Binder, BindingContext, GlobalScope};
use quill_core::cancel::{CancellationToken, Cancelled};
use quill_core::intern::StringInterner;
use quill_core::text::FileId;
use quill_diagnostics::DiagnosticCollection;
use quill_parser::parse_text;
use quill_symbols::{Accessibility, DeclarationModifiers, Member, Symbol, SymbolData, TypeId, TypeTable};
use quill_syntax::ParseOptions;
use rayon::prelude::*;

pub use options::{CompilerOptions, OptionsError};
pub use semantic_model::{BoundUnit, SemanticModel};

/// Name of the type that holds the host globals.
pub const PROGRAM_TYPE_NAME: &str = "Program";
/// Name of the method whose body a source file is.
pub const ENTRY_POINT_NAME: &str = "Main";

#[derive(Debug)]
struct SourceFile {
    file: FileId,
    name: String,
    text: String,
}

/// A set of source files bound against the same globals.
#[derive(Debug)]
pub struct Compilation {
    options: CompilerOptions,
    parse_options: ParseOptions,
    interner: StringInterner,
    types: Arc<TypeTable>,
    program: Arc<Symbol>,
    main: Arc<Symbol>,
    globals: Vec<Arc<Symbol>>,
    sources: Vec<SourceFile>,
}

impl Compilation {
    /// Create a compilation and declare the globals named in `options`.
    pub fn new(options: CompilerOptions) -> Result<Self, OptionsError> {
        let parse_options = options.parse_options()?;
        let interner = StringInterner::new();
        let types = Arc::new(TypeTable::new());
        let program_type = types.declare_object(PROGRAM_TYPE_NAME, IndexMap::new());
        let program = Symbol::named_type(interner.intern(PROGRAM_TYPE_NAME), PROGRAM_TYPE_NAME, None, program_type);
        let main = Symbol::member(
            interner.intern(ENTRY_POINT_NAME),
            ENTRY_POINT_NAME,
            &program,
            Accessibility::Public,
            DeclarationModifiers::STATIC,
            SymbolData::Method {
                return_type: TypeTable::INT,
                parameter_types: Vec::new(),
            },
        );
        let configured = options.resolve_globals(&types)?;

        let mut compilation = Self {
            options,
            parse_options,
            interner,
            types,
            globals: vec![Arc::clone(&main)],
            program,
            main,
            sources: Vec::new(),
        };
        for (name, ty) in configured {
            compilation.declare_global(&name, ty);
        }
        Ok(compilation)
    }

    pub fn options(&self) -> &CompilerOptions {
        &self.options
    }

    pub fn interner(&self) -> &StringInterner {
        &self.interner
    }

    pub fn types(&self) -> &Arc<TypeTable> {
        &self.types
    }

    pub fn program(&self) -> &Arc<Symbol> {
        &self.program
    }

    pub fn entry_point(&self) -> &Arc<Symbol> {
        &self.main
    }

    /// Declare a host object type, visible to source code by name.
    pub fn declare_type(&mut self, name: &str, members: IndexMap<String, Member>) -> TypeId {
        let ty = self.types.declare_object(name, members);
        self.globals.push(Symbol::named_type(self.interner.intern(name), name, Some(&self.program), ty));
        ty
    }

    /// Declare a static field of the program type.
    pub fn declare_global(&mut self, name: &str, ty: TypeId) -> Arc<Symbol> {
        let field = Symbol::member(
            self.interner.intern(name),
            name,
            &self.program,
            Accessibility::Public,
            DeclarationModifiers::STATIC,
            SymbolData::Field { ty },
        );
        self.globals.push(Arc::clone(&field));
        field
    }

    /// Add a source file to the compilation.
    pub fn add_source(&mut self, file_name: impl Into<String>, source_text: impl Into<String>) -> FileId {
        let file = FileId(self.sources.len() as u32);
        self.sources.push(SourceFile {
            file,
            name: file_name.into(),
            text: source_text.into(),
        });
        file
    }

    pub fn source_count(&self) -> usize {
        self.sources.len()
    }

    fn global_scope(&self) -> GlobalScope {
        self.globals
            .iter()
            .fold(GlobalScope::new().owning(Arc::clone(&self.program)), |scope, symbol| {
                scope.with(Arc::clone(symbol))
            })
    }

    /// Parse `file` and prepare its semantic model. Binding happens on the
    /// model's first query.
    pub fn semantic_model(&self, file: FileId) -> Option<SemanticModel> {
        let source = self.sources.get(file.0 as usize)?;
        let (tree, parse_diagnostics) =
            parse_text(source.file, &source.name, &source.text, &self.parse_options, &self.interner);
        let context = BindingContext::new(tree, Arc::clone(&self.types), self.interner.clone());
        let binder = Binder::root(Arc::new(context), Arc::clone(&self.main), self.global_scope());
        Some(SemanticModel::new(binder, parse_diagnostics))
    }

    /// Parse and bind every file in parallel. Returns all diagnostics sorted
    /// by file and position, capped at `maxDiagnostics`.
    #[tracing::instrument(level = "debug", skip_all, fields(files = self.sources.len()))]
    pub fn compile(&self, cancellation: &CancellationToken) -> Result<DiagnosticCollection, Cancelled> {
        let per_file: Vec<DiagnosticCollection> = self
            .sources
            .par_iter()
            .filter_map(|source| self.semantic_model(source.file))
            .map(|model| model.diagnostics(cancellation))
            .collect::<Result<_, _>>()?;

        let mut all_diagnostics = DiagnosticCollection::new();
        for diagnostics in per_file {
            all_diagnostics.extend(diagnostics);
        }
        all_diagnostics.sort();
        if let Some(max) = self.options.max_diagnostics {
            all_diagnostics.truncate(max);
        }
        tracing::debug!(
            diagnostics = all_diagnostics.len(),
            errors = all_diagnostics.error_count(),
            "compiled"
        );
        Ok(all_diagnostics)
    }
}
