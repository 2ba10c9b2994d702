//! Logic compilation and the frozen manager
//!
//! [`LogicManager::new`] freezes the builder's term table and flattens
//! every named clause into a packed postfix program:
//!
//! - `+` / `|` emit `AND` / `OR`
//! - `TRUE` / `FALSE` emit `ANY` / `NONE`
//! - `left<op>right` emits `left right OP`
//! - macros are inlined at every use site
//! - `*Name` splices the compiled program of `Name`
//! - `A?B` compiles `A` if it resolves, else `B`
//! - a bare name resolves to a term, then a cached variable, then the
//!   first resolver match
//!
//! After construction the term table never grows. Compiling additional
//! logic with [`LogicManager::from_string`] may still register variables.

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use tracing::{info, warn};

use rando_core::{
    variable_code, variable_index, LogicOperator, ProgramSymbol, ProgressionState, RandoError,
    RandoResult, Term, TermId, TermTable,
};

use crate::{
    ComparisonType, LogicClause, LogicDef, LogicInt, LogicItem, LogicManagerBuilder,
    LogicProcessor, LogicToken, LogicTransition, LogicWaypoint, OperatorType, RawLogicDef,
    VariableResolver,
};

/// Per-call compilation state
struct CompileContext<'a> {
    /// Uncompiled clauses available to `*Name`
    pending: &'a BTreeMap<String, LogicClause>,
    /// Definitions being compiled, outermost first
    expanding: Vec<String>,
    /// Macros being inlined, outermost first
    macros: Vec<String>,
}

impl<'a> CompileContext<'a> {
    fn new(pending: &'a BTreeMap<String, LogicClause>) -> Self {
        CompileContext {
            pending,
            expanding: Vec::new(),
            macros: Vec::new(),
        }
    }

    fn definition(&self) -> String {
        self.expanding.last().cloned().unwrap_or_default()
    }
}

/// Immutable compiled logic: terms, programs, variables and items
#[derive(Clone, Debug)]
pub struct LogicManager {
    terms: TermTable,
    processor: LogicProcessor,
    variable_resolver: Arc<dyn VariableResolver>,
    variables: Vec<Arc<dyn LogicInt>>,
    variable_lookup: HashMap<String, i32>,
    logic_defs: BTreeMap<String, LogicDef>,
    items: BTreeMap<String, LogicItem>,
    transitions: BTreeMap<String, LogicTransition>,
    waypoints: BTreeMap<String, LogicWaypoint>,
}

impl LogicManager {
    /// Compile everything the builder holds
    pub fn new(builder: &LogicManagerBuilder) -> RandoResult<Self> {
        let mut lm = LogicManager {
            terms: builder.terms().clone(),
            processor: builder.processor.clone(),
            variable_resolver: builder.variable_resolver.clone(),
            variables: Vec::new(),
            variable_lookup: HashMap::new(),
            logic_defs: BTreeMap::new(),
            items: BTreeMap::new(),
            transitions: BTreeMap::new(),
            waypoints: BTreeMap::new(),
        };

        let pending = &builder.logic_lookup;
        for (name, clause) in pending {
            // already compiled as the target of a reference
            if lm.logic_defs.contains_key(name) {
                continue;
            }
            let mut ctx = CompileContext::new(pending);
            let def = lm.compile_clause(name, clause, &mut ctx)?;
            lm.logic_defs.insert(name.clone(), def);
        }

        for name in builder.waypoints.keys() {
            let waypoint = LogicWaypoint {
                term: lm.get_term_strict(name)?,
                logic: lm.compiled_logic(name)?,
            };
            lm.waypoints.insert(name.clone(), waypoint);
        }

        for (name, raw) in &builder.transitions {
            let transition = LogicTransition {
                name: name.clone(),
                scene: raw.scene.clone(),
                gate: raw.gate.clone(),
                term: lm.get_term_strict(name)?,
                logic: lm.compiled_logic(name)?,
                one_way: raw.one_way,
            };
            lm.transitions.insert(name.clone(), transition);
        }

        for template in builder.item_templates.values() {
            let item = template.create(&mut lm)?;
            lm.items.insert(item.name().to_string(), item);
        }
        lm.items.extend(
            builder
                .prefab_items
                .iter()
                .map(|(name, item)| (name.clone(), item.clone())),
        );

        info!(
            terms = lm.terms.len(),
            variables = lm.variables.len(),
            logic_defs = lm.logic_defs.len(),
            items = lm.items.len(),
            transitions = lm.transitions.len(),
            waypoints = lm.waypoints.len(),
            "Logic manager constructed"
        );

        Ok(lm)
    }

    fn compiled_logic(&self, name: &str) -> RandoResult<LogicDef> {
        self.logic_defs
            .get(name)
            .cloned()
            .ok_or_else(|| RandoError::UnknownReference {
                definition: name.to_string(),
                target: name.to_string(),
            })
    }

    /// Parse and compile additional logic against the frozen term table.
    /// The result is not registered as a named definition.
    pub fn from_string(&mut self, raw: &RawLogicDef) -> RandoResult<LogicDef> {
        let clause = self.processor.parse_infix(&raw.name, &raw.logic)?;
        self.from_clause(&raw.name, &clause)
    }

    /// Compile an already-parsed clause
    pub fn from_clause(&mut self, name: &str, clause: &LogicClause) -> RandoResult<LogicDef> {
        let pending = BTreeMap::new();
        let mut ctx = CompileContext::new(&pending);
        self.compile_clause(name, clause, &mut ctx)
    }

    fn compile_clause(
        &mut self,
        name: &str,
        clause: &LogicClause,
        ctx: &mut CompileContext<'_>,
    ) -> RandoResult<LogicDef> {
        ctx.expanding.push(name.to_string());
        let mut program = Vec::with_capacity(clause.len());
        for token in clause.tokens() {
            self.apply_token(token, &mut program, ctx)?;
        }
        ctx.expanding.pop();
        Ok(LogicDef::compiled(name, program))
    }

    fn apply_token(
        &mut self,
        token: &LogicToken,
        program: &mut Vec<i32>,
        ctx: &mut CompileContext<'_>,
    ) -> RandoResult<()> {
        match token {
            LogicToken::Operator(OperatorType::And) => program.push(LogicOperator::And.code()),
            LogicToken::Operator(OperatorType::Or) => program.push(LogicOperator::Or.code()),
            LogicToken::Const(true) => program.push(LogicOperator::Any.code()),
            LogicToken::Const(false) => program.push(LogicOperator::None.code()),
            LogicToken::Simple(name) => self.apply_term_or_variable(name, program, ctx)?,
            LogicToken::Comparison { kind, left, right } => {
                self.apply_term_or_variable(left, program, ctx)?;
                self.apply_term_or_variable(right, program, ctx)?;
                let op = match kind {
                    ComparisonType::Eq => LogicOperator::Eq,
                    ComparisonType::Lt => LogicOperator::Lt,
                    ComparisonType::Gt => LogicOperator::Gt,
                };
                program.push(op.code());
            }
            LogicToken::Macro(name) => {
                if ctx.macros.iter().any(|m| m == name) {
                    return Err(RandoError::CircularReference(name.clone()));
                }
                let clause = self
                    .processor
                    .get_macro(name)
                    .cloned()
                    .ok_or_else(|| RandoError::UnknownMacro(name.clone()))?;
                ctx.macros.push(name.clone());
                for inner in clause.tokens() {
                    self.apply_token(inner, program, ctx)?;
                }
                ctx.macros.pop();
            }
            LogicToken::Reference(target) => self.apply_reference(target, program, ctx)?,
            LogicToken::Coalescing { left, right } => {
                if self.token_resolves(left, ctx) {
                    self.apply_token(left, program, ctx)?;
                } else {
                    self.apply_token(right, program, ctx)?;
                }
            }
        }
        Ok(())
    }

    fn apply_reference(
        &mut self,
        target: &str,
        program: &mut Vec<i32>,
        ctx: &mut CompileContext<'_>,
    ) -> RandoResult<()> {
        if let Some(def) = self.logic_defs.get(target) {
            program.extend_from_slice(def.program());
            return Ok(());
        }
        if ctx.expanding.iter().any(|name| name == target) {
            return Err(RandoError::CircularReference(target.to_string()));
        }

        let pending = ctx.pending;
        let clause = pending
            .get(target)
            .ok_or_else(|| RandoError::UnknownReference {
                definition: ctx.definition(),
                target: target.to_string(),
            })?;
        let def = self.compile_clause(target, clause, ctx)?;
        program.extend_from_slice(def.program());
        self.logic_defs.insert(target.to_string(), def);
        Ok(())
    }

    fn apply_term_or_variable(
        &mut self,
        name: &str,
        program: &mut Vec<i32>,
        ctx: &CompileContext<'_>,
    ) -> RandoResult<()> {
        match self.resolve_name(name) {
            Some(code) => {
                program.push(code);
                Ok(())
            }
            None => Err(RandoError::UnresolvedName {
                definition: ctx.definition(),
                name: name.to_string(),
            }),
        }
    }

    /// Term id, cached variable code, or a freshly registered variable
    fn resolve_name(&mut self, name: &str) -> Option<i32> {
        if let Some(term) = self.terms.id_of(name) {
            return Some(term.to_code());
        }
        if let Some(&code) = self.variable_lookup.get(name) {
            return Some(code);
        }
        let variable = self.variable_resolver.try_match(&self.terms, name)?;
        let code = variable_code(self.variables.len());
        self.variables.push(variable);
        self.variable_lookup.insert(name.to_string(), code);
        Some(code)
    }

    /// Whether a bare name would resolve, without registering anything
    fn is_defined(&self, name: &str) -> bool {
        self.terms.contains(name)
            || self.variable_lookup.contains_key(name)
            || self.variable_resolver.try_match(&self.terms, name).is_some()
    }

    fn token_resolves(&self, token: &LogicToken, ctx: &CompileContext<'_>) -> bool {
        match token {
            LogicToken::Simple(name) => self.is_defined(name),
            LogicToken::Macro(name) => self.processor.is_macro(name),
            LogicToken::Reference(target) => {
                self.logic_defs.contains_key(target) || ctx.pending.contains_key(target)
            }
            LogicToken::Comparison { left, right, .. } => {
                self.is_defined(left) && self.is_defined(right)
            }
            LogicToken::Coalescing { left, right } => {
                self.token_resolves(left, ctx) || self.token_resolves(right, ctx)
            }
            LogicToken::Const(_) | LogicToken::Operator(_) => true,
        }
    }

    /// Lookup by name, logging a miss
    pub fn get_term(&self, name: &str) -> Option<TermId> {
        let term = self.terms.id_of(name);
        if term.is_none() {
            warn!(term = name, "Unknown term requested");
        }
        term
    }

    /// Lookup by name, failing on a miss
    pub fn get_term_strict(&self, name: &str) -> RandoResult<TermId> {
        self.terms
            .id_of(name)
            .ok_or_else(|| RandoError::UnknownTerm(name.to_string()))
    }

    pub fn get_term_by_id(&self, id: TermId) -> Option<&Term> {
        self.terms.by_id(id)
    }

    /// Registered name of a term, or its numeric id if unregistered
    pub fn term_name(&self, id: TermId) -> String {
        match self.terms.by_id(id) {
            Some(term) => term.name.clone(),
            None => id.to_string(),
        }
    }

    pub fn terms(&self) -> &TermTable {
        &self.terms
    }

    pub fn get_logic_def(&self, name: &str) -> Option<&LogicDef> {
        let def = self.logic_defs.get(name);
        if def.is_none() {
            warn!(logic = name, "Unknown logic definition requested");
        }
        def
    }

    pub fn get_item(&self, name: &str) -> Option<&LogicItem> {
        let item = self.items.get(name);
        if item.is_none() {
            warn!(item = name, "Unknown item requested");
        }
        item
    }

    pub fn get_transition(&self, name: &str) -> Option<&LogicTransition> {
        let transition = self.transitions.get(name);
        if transition.is_none() {
            warn!(transition = name, "Unknown transition requested");
        }
        transition
    }

    pub fn get_waypoint(&self, name: &str) -> Option<&LogicWaypoint> {
        let waypoint = self.waypoints.get(name);
        if waypoint.is_none() {
            warn!(waypoint = name, "Unknown waypoint requested");
        }
        waypoint
    }

    /// Variable registered under a program code
    pub fn get_variable(&self, code: i32) -> Option<&dyn LogicInt> {
        self.variables
            .get(variable_index(code)?)
            .map(|variable| variable.as_ref())
    }

    /// Program code of a resolved variable name
    pub fn get_variable_code(&self, name: &str) -> Option<i32> {
        self.variable_lookup.get(name).copied()
    }

    /// Value of the variable registered under `code`; unknown codes read 0
    pub fn evaluate_variable(
        &self,
        requester: &str,
        state: &dyn ProgressionState,
        code: i32,
    ) -> i32 {
        match self.get_variable(code) {
            Some(variable) => variable.value(requester, state),
            None => {
                warn!(code, requester, "Unknown variable evaluated");
                0
            }
        }
    }

    /// Variables in slot order
    pub fn variables(&self) -> impl Iterator<Item = &dyn LogicInt> {
        self.variables.iter().map(|variable| variable.as_ref())
    }

    pub fn logic_defs(&self) -> impl Iterator<Item = &LogicDef> {
        self.logic_defs.values()
    }

    pub fn items(&self) -> impl Iterator<Item = &LogicItem> {
        self.items.values()
    }

    pub fn transitions(&self) -> impl Iterator<Item = &LogicTransition> {
        self.transitions.values()
    }

    pub fn waypoints(&self) -> impl Iterator<Item = &LogicWaypoint> {
        self.waypoints.values()
    }

    pub fn processor(&self) -> &LogicProcessor {
        &self.processor
    }

    pub fn variable_resolver(&self) -> &Arc<dyn VariableResolver> {
        &self.variable_resolver
    }

    fn symbol_name(&self, code: i32) -> String {
        match ProgramSymbol::decode(code) {
            Some(ProgramSymbol::Term(term)) => self.term_name(term),
            Some(ProgramSymbol::Variable(_)) => match self.get_variable(code) {
                Some(variable) => variable.name().to_string(),
                None => code.to_string(),
            },
            _ => code.to_string(),
        }
    }

    /// Rebuild a postfix clause from a compiled program. Macros and
    /// references come back expanded.
    pub fn to_clause(&self, def: &LogicDef) -> LogicClause {
        let mut tokens: Vec<LogicToken> = Vec::with_capacity(def.program().len());
        for &code in def.program() {
            let token = match ProgramSymbol::decode(code) {
                Some(ProgramSymbol::Operator(op)) => match op {
                    LogicOperator::And => LogicToken::Operator(OperatorType::And),
                    LogicOperator::Or => LogicToken::Operator(OperatorType::Or),
                    LogicOperator::Any => LogicToken::TRUE,
                    LogicOperator::None => LogicToken::FALSE,
                    LogicOperator::Eq | LogicOperator::Lt | LogicOperator::Gt => {
                        let right = operand_name(tokens.pop());
                        let left = operand_name(tokens.pop());
                        let kind = match op {
                            LogicOperator::Eq => ComparisonType::Eq,
                            LogicOperator::Lt => ComparisonType::Lt,
                            _ => ComparisonType::Gt,
                        };
                        LogicToken::Comparison { kind, left, right }
                    }
                },
                _ => LogicToken::Simple(self.symbol_name(code)),
            };
            tokens.push(token);
        }
        LogicClause::from_postfix(tokens)
    }

    /// Semantically equivalent infix text of a compiled program
    pub fn to_infix(&self, def: &LogicDef) -> String {
        self.to_clause(def).to_infix()
    }
}

fn operand_name(token: Option<LogicToken>) -> String {
    match token {
        Some(LogicToken::Simple(name)) => name,
        Some(other) => other.write(),
        None => String::new(),
    }
}
