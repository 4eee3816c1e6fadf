//! Executes parsed schema statements against bound schema handles.

use crate::client::schema::{
    BaseType, Cardinality, DataType, EdgeLabel, Frequency, IdStrategy, IndexLabel, IndexType,
    PropertyKey, SchemaElement, SchemaKind, VertexLabel,
};
use crate::client::{CreateOutcome, GraphClient, SchemaHandle};
use crate::error::LoadError;
use crate::script::parser::{self, Arg, Call, Statement};
use serde::Serialize;
use std::collections::HashMap;
use tracing::{debug, info};

/// What a script did to the graph
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ExecutionReport {
    pub statements: usize,
    pub created: Vec<(SchemaKind, String)>,
    /// Elements skipped through `ifNotExist()`
    pub skipped: Vec<(SchemaKind, String)>,
    pub removed: Vec<(SchemaKind, String)>,
}

/// Holds variable bindings and evaluates scripts in a fresh environment each time
#[derive(Clone, Default)]
pub struct ScriptRunner {
    bindings: HashMap<String, SchemaHandle>,
}

impl ScriptRunner {
    pub fn new() -> Self {
        Self::default()
    }

    /// Expose `handle` to scripts under `name`
    pub fn bind(&mut self, name: impl Into<String>, handle: SchemaHandle) -> &mut Self {
        self.bindings.insert(name.into(), handle);
        self
    }

    /// Run `script`, stopping at the first failing statement. Statements already
    /// applied stay applied.
    pub fn execute(&self, script: &str, client: &GraphClient) -> Result<ExecutionReport, LoadError> {
        let statements = parser::parse(script)?;
        let environment = self.bindings.clone();
        let mut report = ExecutionReport::default();

        debug!(graph = %client.graph(), statements = statements.len(), "Executing schema script");
        for statement in &statements {
            execute_statement(&environment, statement, &mut report)?;
            report.statements += 1;
        }
        info!(
            graph = %client.graph(),
            created = report.created.len(),
            skipped = report.skipped.len(),
            removed = report.removed.len(),
            "Schema script finished"
        );
        Ok(report)
    }
}

enum Terminal {
    Create,
    Remove,
}

fn execute_statement(
    environment: &HashMap<String, SchemaHandle>,
    statement: &Statement,
    report: &mut ExecutionReport,
) -> Result<(), LoadError> {
    let handle = environment.get(&statement.receiver).ok_or_else(|| {
        LoadError::script(
            statement.line,
            format!("No such property: {}", statement.receiver),
        )
    })?;

    let (first, rest) = statement
        .calls
        .split_first()
        .ok_or_else(|| LoadError::script(statement.line, "Empty statement"))?;
    let mut builder = ElementBuilder::start(first)?;
    let mut terminal = None;

    for call in rest {
        if terminal.is_some() {
            return Err(LoadError::script(
                call.line,
                format!("Unexpected call '{}' after the statement was completed", call.method),
            ));
        }
        match call.method.as_str() {
            "create" => {
                no_args(call)?;
                terminal = Some(Terminal::Create);
            }
            "remove" => {
                no_args(call)?;
                terminal = Some(Terminal::Remove);
            }
            "ifNotExist" => {
                no_args(call)?;
                builder.if_not_exist = true;
            }
            _ => builder.apply(call)?,
        }
    }

    let line = statement.line;
    match terminal {
        Some(Terminal::Create) => {
            let element = builder.build(line)?;
            let entry = (element.kind(), element.name().to_string());
            match handle
                .create(&element, builder.if_not_exist)
                .map_err(|e| remote_failure(line, e))?
            {
                CreateOutcome::Created(_) => {
                    debug!(kind = %entry.0, name = %entry.1, "Created schema element");
                    report.created.push(entry);
                }
                CreateOutcome::Existed(_) => report.skipped.push(entry),
            }
            Ok(())
        }
        Some(Terminal::Remove) => {
            let kind = builder.kind();
            handle
                .remove(kind, &builder.name)
                .map_err(|e| remote_failure(line, e))?;
            debug!(kind = %kind, name = %builder.name, "Removed schema element");
            report.removed.push((kind, builder.name));
            Ok(())
        }
        None => Err(LoadError::script(
            line,
            "Statement must end with create() or remove()",
        )),
    }
}

// Server and connection failures keep their kind; closed clients keep theirs too.
fn remote_failure(line: usize, error: LoadError) -> LoadError {
    match error {
        LoadError::RemoteService(message) => {
            LoadError::RemoteService(format!("line {}: {}", line, message))
        }
        other => other,
    }
}

fn no_args(call: &Call) -> Result<(), LoadError> {
    if call.args.is_empty() {
        Ok(())
    } else {
        Err(LoadError::script(
            call.line,
            format!("{}() takes no arguments", call.method),
        ))
    }
}

fn strings(call: &Call) -> Result<Vec<String>, LoadError> {
    call.args
        .iter()
        .map(|arg| match arg {
            Arg::Str(s) => Ok(s.clone()),
            other => Err(LoadError::script(
                call.line,
                format!("{}() expects string arguments, got {}", call.method, other),
            )),
        })
        .collect()
}

fn single_string(call: &Call) -> Result<String, LoadError> {
    match call.args.as_slice() {
        [Arg::Str(s)] => Ok(s.clone()),
        _ => Err(LoadError::script(
            call.line,
            format!("{}() expects exactly one string argument", call.method),
        )),
    }
}

fn flag(call: &Call) -> Result<bool, LoadError> {
    match call.args.as_slice() {
        [] => Ok(true),
        [Arg::Bool(b)] => Ok(*b),
        _ => Err(LoadError::script(
            call.line,
            format!("{}() expects a boolean argument", call.method),
        )),
    }
}

enum Draft {
    Key(PropertyKey),
    Vertex(VertexLabel),
    Edge {
        label: EdgeLabel,
        source: Option<String>,
        target: Option<String>,
    },
    Index {
        index_type: IndexType,
        base: Option<(BaseType, String)>,
        fields: Vec<String>,
    },
}

struct ElementBuilder {
    name: String,
    if_not_exist: bool,
    draft: Draft,
}

impl ElementBuilder {
    fn start(call: &Call) -> Result<Self, LoadError> {
        let name = match call.method.as_str() {
            "propertyKey" | "vertexLabel" | "edgeLabel" | "indexLabel" => single_string(call)?,
            other => {
                return Err(LoadError::script(
                    call.line,
                    format!("Unknown schema builder '{}'", other),
                ))
            }
        };
        if name.trim().is_empty() {
            return Err(LoadError::script(call.line, "Schema element name cannot be empty"));
        }
        let draft = match call.method.as_str() {
            "propertyKey" => Draft::Key(PropertyKey {
                name: name.clone(),
                data_type: DataType::default(),
                cardinality: Cardinality::default(),
            }),
            "vertexLabel" => Draft::Vertex(VertexLabel {
                name: name.clone(),
                id_strategy: IdStrategy::default(),
                properties: Vec::new(),
                primary_keys: Vec::new(),
                nullable_keys: Vec::new(),
                enable_label_index: true,
            }),
            "edgeLabel" => Draft::Edge {
                label: EdgeLabel {
                    name: name.clone(),
                    source_label: String::new(),
                    target_label: String::new(),
                    frequency: Frequency::default(),
                    properties: Vec::new(),
                    sort_keys: Vec::new(),
                    nullable_keys: Vec::new(),
                    enable_label_index: true,
                },
                source: None,
                target: None,
            },
            _ => Draft::Index {
                index_type: IndexType::default(),
                base: None,
                fields: Vec::new(),
            },
        };
        Ok(Self {
            name,
            if_not_exist: false,
            draft,
        })
    }

    fn kind(&self) -> SchemaKind {
        match self.draft {
            Draft::Key(_) => SchemaKind::PropertyKey,
            Draft::Vertex(_) => SchemaKind::VertexLabel,
            Draft::Edge { .. } => SchemaKind::EdgeLabel,
            Draft::Index { .. } => SchemaKind::IndexLabel,
        }
    }

    fn apply(&mut self, call: &Call) -> Result<(), LoadError> {
        let method = call.method.as_str();
        let kind = self.kind();
        let unknown = || {
            LoadError::script(
                call.line,
                format!("No method '{}' on {} builder", call.method, kind),
            )
        };
        match &mut self.draft {
            Draft::Key(key) => {
                let data_type = match method {
                    "asText" => Some(DataType::Text),
                    "asInt" => Some(DataType::Int),
                    "asLong" => Some(DataType::Long),
                    "asFloat" => Some(DataType::Float),
                    "asDouble" => Some(DataType::Double),
                    "asBoolean" => Some(DataType::Boolean),
                    "asDate" => Some(DataType::Date),
                    "asUUID" => Some(DataType::Uuid),
                    "asBlob" => Some(DataType::Blob),
                    "asByte" => Some(DataType::Byte),
                    _ => None,
                };
                let cardinality = match method {
                    "valueSingle" => Some(Cardinality::Single),
                    "valueList" => Some(Cardinality::List),
                    "valueSet" => Some(Cardinality::Set),
                    _ => None,
                };
                match (data_type, cardinality) {
                    (Some(data_type), _) => {
                        no_args(call)?;
                        key.data_type = data_type;
                    }
                    (_, Some(cardinality)) => {
                        no_args(call)?;
                        key.cardinality = cardinality;
                    }
                    _ => return Err(unknown()),
                }
            }
            Draft::Vertex(label) => match method {
                "properties" => label.properties.extend(strings(call)?),
                "primaryKeys" => label.primary_keys.extend(strings(call)?),
                "nullableKeys" => label.nullable_keys.extend(strings(call)?),
                "useAutomaticId" => {
                    no_args(call)?;
                    label.id_strategy = IdStrategy::Automatic;
                }
                "usePrimaryKeyId" => {
                    no_args(call)?;
                    label.id_strategy = IdStrategy::PrimaryKey;
                }
                "useCustomizeStringId" => {
                    no_args(call)?;
                    label.id_strategy = IdStrategy::CustomizeString;
                }
                "useCustomizeNumberId" => {
                    no_args(call)?;
                    label.id_strategy = IdStrategy::CustomizeNumber;
                }
                "enableLabelIndex" => label.enable_label_index = flag(call)?,
                _ => return Err(unknown()),
            },
            Draft::Edge {
                label,
                source,
                target,
            } => match method {
                "sourceLabel" => *source = Some(single_string(call)?),
                "targetLabel" => *target = Some(single_string(call)?),
                "link" => match strings(call)?.as_slice() {
                    [from, to] => {
                        *source = Some(from.clone());
                        *target = Some(to.clone());
                    }
                    _ => {
                        return Err(LoadError::script(
                            call.line,
                            "link() expects source and target label names",
                        ))
                    }
                },
                "properties" => label.properties.extend(strings(call)?),
                "sortKeys" => label.sort_keys.extend(strings(call)?),
                "nullableKeys" => label.nullable_keys.extend(strings(call)?),
                "singleTime" => {
                    no_args(call)?;
                    label.frequency = Frequency::Single;
                }
                "multiTimes" => {
                    no_args(call)?;
                    label.frequency = Frequency::Multiple;
                }
                "enableLabelIndex" => label.enable_label_index = flag(call)?,
                _ => return Err(unknown()),
            },
            Draft::Index {
                index_type,
                base,
                fields,
            } => match method {
                "onV" => *base = Some((BaseType::VertexLabel, single_string(call)?)),
                "onE" => *base = Some((BaseType::EdgeLabel, single_string(call)?)),
                "by" => fields.extend(strings(call)?),
                "secondary" | "range" | "search" | "shard" | "unique" => {
                    no_args(call)?;
                    *index_type = match method {
                        "secondary" => IndexType::Secondary,
                        "range" => IndexType::Range,
                        "search" => IndexType::Search,
                        "shard" => IndexType::Shard,
                        _ => IndexType::Unique,
                    };
                }
                _ => return Err(unknown()),
            },
        }
        Ok(())
    }

    fn build(&self, line: usize) -> Result<SchemaElement, LoadError> {
        match &self.draft {
            Draft::Key(key) => Ok(SchemaElement::PropertyKey(key.clone())),
            Draft::Vertex(label) => {
                let mut label = label.clone();
                if label.id_strategy == IdStrategy::Default && !label.primary_keys.is_empty() {
                    label.id_strategy = IdStrategy::PrimaryKey;
                }
                Ok(SchemaElement::VertexLabel(label))
            }
            Draft::Edge {
                label,
                source,
                target,
            } => match (source, target) {
                (Some(source), Some(target)) => {
                    let mut label = label.clone();
                    label.source_label = source.clone();
                    label.target_label = target.clone();
                    Ok(SchemaElement::EdgeLabel(label))
                }
                _ => Err(LoadError::script(
                    line,
                    format!(
                        "Edge label '{}' must set both sourceLabel and targetLabel",
                        self.name
                    ),
                )),
            },
            Draft::Index {
                index_type,
                base,
                fields,
            } => {
                let (base_type, base_value) = base.clone().ok_or_else(|| {
                    LoadError::script(
                        line,
                        format!("Index label '{}' must be declared onV() or onE()", self.name),
                    )
                })?;
                Ok(SchemaElement::IndexLabel(IndexLabel {
                    name: self.name.clone(),
                    base_type,
                    base_value,
                    index_type: *index_type,
                    fields: fields.clone(),
                }))
            }
        }
    }
}
