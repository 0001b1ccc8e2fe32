//! The diagnostic sink and its rendering. Both the parser and the
//! analyzer append to a [`DiagnosticSink`]; the sink never deduplicates
//! and never reorders — see `spec.md` §4.5 and §5.

use std::fmt;

use crate::ast::Type;
use crate::source_buffer::SourceBuffer;

impl fmt::Display for Type {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Type::Base(name) => write!(f, "{name}"),
            Type::Ptr(inner) => write!(f, "pointeur sur {inner}"),
            Type::Table(ranges, inner) => {
                write!(f, "tableau[")?;
                for (i, r) in ranges.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    match r.end {
                        Some(end) => write!(f, "{}..{}", r.start, end)?,
                        None => write!(f, "{}..", r.start)?,
                    }
                }
                write!(f, "] de {inner}")
            }
        }
    }
}

/// Every named error kind from `spec.md` §7, with the fields the
/// rendered message needs. `Display` produces the French message text
/// (without the `Erreur de syntaxe:`/`Erreur sémantique:` prefix, which
/// [`Diagnostic::render`] adds based on [`Severity`]).
#[derive(Debug, Clone, thiserror::Error)]
pub enum ErrorKind {
    // --- Lexical ---
    #[error("caractère illégal « {ch} »")]
    IllegalCharacter { ch: char },
    #[error("littéral caractère mal formé")]
    MalformedCharLiteral,

    // --- Syntactic ---
    #[error("{expected} attendu")]
    Expected { expected: String },
    #[error("FinAlgo attendu")]
    ExpectedFinAlgo,
    #[error("FinSa attendu")]
    ExpectedFinSa,
    #[error("FinSi attendu")]
    ExpectedFinSi,
    #[error("FinTq attendu")]
    ExpectedFinTq,
    #[error("FinPour attendu")]
    ExpectedFinPour,
    #[error("un appel avec « ! » ne peut pas servir d'expression")]
    CallWithBangNotAnExpression,

    // --- Naming ---
    #[error("le nom « {name} » est un mot réservé du langage cible")]
    ReservedNameCollision { name: String },
    #[error("la variable « {name} » est redéclarée dans la même portée")]
    VariableRedeclaration { name: String },
    #[error("le type « {name} » est redéfini")]
    TypeRedefinition { name: String },
    #[error("le sous-algorithme « {name} » est redéfini")]
    SubAlgoRedefinition { name: String },
    #[error("l'attribut « {name} » est redéclaré")]
    AttributeRedeclaration { name: String },
    #[error("le nom « {name} » entre en collision avec un identifiant d'une autre nature")]
    IdentifierCollision { name: String },

    // --- Type-structural ---
    #[error("le type de base « {name} » est inconnu")]
    UnknownBaseType { name: String },
    #[error("la borne de fin d'un intervalle de tableau doit être strictement supérieure à la borne de début")]
    TableRangeInvalidEnd,
    #[error("une dimension de tableau non dimensionnée n'est permise que pour les paramètres")]
    TableEndNotDefinedForVariable,
    #[error("le type « {name} » se contient lui-même de manière récursive")]
    TypeDefinitionRecursion { name: String },

    // --- Reference ---
    #[error("la variable « {name} » n'est pas déclarée")]
    UndeclaredVariable { name: String },
    #[error("le sous-algorithme « {name} » n'est pas défini")]
    UndefinedFunction { name: String },
    #[error("l'attribut « {field} » n'existe pas sur le type « {type_name} »")]
    InvalidAttribute { type_name: String, field: String },
    #[error("l'accès à un attribut n'est possible que sur une valeur de type article")]
    NonCustomTypeAttributeAccess,
    #[error("l'indexation n'est possible que sur une valeur de type tableau")]
    NonTableElementAccess,
    #[error("le nombre d'indices ({got}) ne correspond pas au nombre de dimensions ({expected})")]
    UnmatchedTableIndexes { expected: usize, got: usize },

    // --- Operator ---
    #[error("l'opérateur « {op} » exige des opérandes numériques")]
    InvalidBinaryOperationTermType { op: String },
    #[error("l'opérateur unaire « {op} » exige un opérande numérique")]
    InvalidUnaryOperationExpressionType { op: String },
    #[error("le déréférencement n'est possible que sur une valeur de type pointeur")]
    NonPointerDereference,
    #[error("« non » exige un opérande booléen")]
    NonBooleanUnaryNot,
    #[error("comparaison entre deux types différents ({left} et {right})")]
    DifferentTypesComparison { left: String, right: String },

    // --- Assignment / call ---
    #[error("cette expression ne désigne pas un emplacement assignable")]
    NonAssignableExpression,
    #[error("un tableau entier ne peut pas être assigné")]
    TableAssignment,
    #[error("type incompatible dans l'assignation ({rhs} ne correspond pas à {lhs})")]
    IncompatibleAssignmentTypes { lhs: String, rhs: String },
    #[error("le paramètre d'entrée attend le type {expected}, {got} fourni")]
    IncompatibleInputType { expected: String, got: String },
    #[error("le paramètre de sortie attend le type {expected}, {got} fourni")]
    IncompatibleOutputType { expected: String, got: String },
    #[error("nombre de paramètres d'entrée incorrect : {expected} attendu(s), {got} fourni(s)")]
    UnmatchedNumberOfInputs { expected: usize, got: usize },
    #[error("nombre de paramètres de sortie incorrect : {expected} attendu(s), {got} fourni(s)")]
    UnmatchedNumberOfOutputs { expected: usize, got: usize },
    #[error("un appel comme expression exige un sous-algorithme à une seule sortie")]
    NonUniqueOutputFunctionExpression,

    // --- Control-flow typing ---
    #[error("la variable de boucle « Pour » doit être de type entier")]
    NonIntegerIterationVariable,
    #[error("la borne de début de la boucle « Pour » doit être de type entier")]
    NonIntegerStart,
    #[error("la borne de fin de la boucle « Pour » doit être de type entier")]
    NonIntegerEnd,
    #[error("un indice de tableau doit être de type entier")]
    NonIntegerIndex,
    #[error("la condition du « TantQue » doit être de type booléen")]
    NonBooleanWhileCondition,
    #[error("la condition du « Si » doit être de type booléen")]
    NonBooleanIfCondition,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Syntax,
    Semantic,
}

/// One diagnostic: a rendered message tied to one or more source
/// positions. Single-position semantic errors are `StandardSemanticError`
/// in spirit; two or more positions make it a `MultiSemanticError` (or,
/// when they land on different lines, a `DoubleLineError`) — this single
/// type covers all three by carrying a `Vec` of positions instead of a
/// closed set of shapes.
#[derive(Debug, Clone)]
pub struct Diagnostic {
    pub severity: Severity,
    pub message: String,
    /// Byte offsets, in the order they should be rendered.
    pub positions: Vec<usize>,
    pub trailer: Option<String>,
}

impl Diagnostic {
    pub fn syntax(kind: ErrorKind, offset: usize) -> Diagnostic {
        Diagnostic {
            severity: Severity::Syntax,
            message: kind.to_string(),
            positions: vec![offset],
            trailer: None,
        }
    }

    pub fn semantic(kind: ErrorKind, offset: usize) -> Diagnostic {
        Diagnostic {
            severity: Severity::Semantic,
            message: kind.to_string(),
            positions: vec![offset],
            trailer: None,
        }
    }

    pub fn semantic_multi(kind: ErrorKind, offsets: Vec<usize>) -> Diagnostic {
        Diagnostic {
            severity: Severity::Semantic,
            message: kind.to_string(),
            positions: offsets,
            trailer: None,
        }
    }

    pub fn with_trailer(mut self, trailer: impl Into<String>) -> Diagnostic {
        self.trailer = Some(trailer.into());
        self
    }

    /// Renders this diagnostic against `buf` following the algorithm in
    /// `spec.md` §4.5, verbatim: one line-header per physical line
    /// touched (singular/plural forms), the source line under a
    /// `  L | ` gutter, a caret line with one `^` per column, the
    /// `Erreur de syntaxe:`/`Erreur sémantique:` message, and an
    /// optional `-> ` trailer.
    pub fn render(&self, buf: &SourceBuffer) -> String {
        let mut out = String::new();

        let mut groups: Vec<(usize, String, Vec<usize>)> = Vec::new();
        for &pos in &self.positions {
            let lc = buf.line_col(pos);
            if let Some(last) = groups.last_mut() {
                if last.0 == lc.line {
                    last.2.push(lc.column);
                    continue;
                }
            }
            groups.push((lc.line, lc.line_text, vec![lc.column]));
        }

        for (line, text, columns) in &groups {
            if columns.len() == 1 {
                out.push_str(&format!("Ligne {}, colonne {}\n", line, columns[0]));
            } else {
                let (last, rest) = columns.split_last().unwrap();
                let head = rest.iter().map(usize::to_string).collect::<Vec<_>>().join(", ");
                out.push_str(&format!("Ligne {}, colonnes {} et {}\n", line, head, last));
            }

            let gutter = format!("  {} | ", line);
            out.push_str(&gutter);
            out.push_str(text);
            out.push('\n');

            let pad: String = " ".repeat(gutter.len());
            let mut sorted = columns.clone();
            sorted.sort_unstable();
            let mut caret_line = String::new();
            for col in sorted {
                while caret_line.chars().count() + 1 < col {
                    caret_line.push(' ');
                }
                caret_line.push('^');
            }
            out.push_str(&pad);
            out.push_str(&caret_line);
            out.push('\n');
        }

        let prefix = match self.severity {
            Severity::Syntax => "Erreur de syntaxe: ",
            Severity::Semantic => "Erreur sémantique: ",
        };
        out.push_str(prefix);
        out.push_str(&self.message);
        out.push('\n');

        if let Some(trailer) = &self.trailer {
            out.push_str("-> ");
            out.push_str(trailer);
            out.push('\n');
        }

        out
    }
}

/// Append-only, insertion-ordered list of diagnostics, shared by the
/// parser and the analyzer (`spec.md` §2.6, §5).
#[derive(Debug, Default, Clone)]
pub struct DiagnosticSink {
    diagnostics: Vec<Diagnostic>,
}

impl DiagnosticSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, diagnostic: Diagnostic) {
        self.diagnostics.push(diagnostic);
    }

    pub fn is_empty(&self) -> bool {
        self.diagnostics.is_empty()
    }

    pub fn len(&self) -> usize {
        self.diagnostics.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Diagnostic> {
        self.diagnostics.iter()
    }

    pub fn into_vec(self) -> Vec<Diagnostic> {
        self.diagnostics
    }

    pub fn render_all(&self, buf: &SourceBuffer) -> String {
        self.diagnostics
            .iter()
            .map(|d| d.render(buf))
            .collect::<Vec<_>>()
            .join("\n")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn single_position_header_is_singular() {
        let buf = SourceBuffer::new("x <-- 1\n");
        let d = Diagnostic::semantic(
            ErrorKind::UndeclaredVariable { name: "x".into() },
            0,
        );
        let rendered = d.render(&buf);
        assert!(rendered.starts_with("Ligne 1, colonne 1\n"));
        assert!(rendered.contains("  1 | x <-- 1\n"));
        assert!(rendered.contains("  ^\n") || rendered.contains("^"));
        assert!(rendered.contains("Erreur sémantique:"));
    }

    #[test]
    fn multi_position_same_line_is_plural() {
        let buf = SourceBuffer::new("a = b\n");
        let d = Diagnostic::semantic_multi(
            ErrorKind::DifferentTypesComparison {
                left: "entier".into(),
                right: "booléen".into(),
            },
            vec![0, 4],
        );
        let rendered = d.render(&buf);
        assert!(rendered.starts_with("Ligne 1, colonnes 1 et 5\n"));
    }

    #[test]
    fn multi_position_different_lines_stacks_headers() {
        let buf = SourceBuffer::new("Article Point\nArticle Point\n");
        let d = Diagnostic::semantic_multi(
            ErrorKind::TypeRedefinition {
                name: "Point".into(),
            },
            vec![0, 14],
        );
        let rendered = d.render(&buf);
        assert!(rendered.contains("Ligne 1, colonne 1\n"));
        assert!(rendered.contains("Ligne 2, colonne 1\n"));
    }

    #[test]
    fn syntax_vs_semantic_prefix() {
        let buf = SourceBuffer::new("x\n");
        let syn = Diagnostic::syntax(
            ErrorKind::Expected {
                expected: "FinAlgo".into(),
            },
            0,
        );
        assert!(syn.render(&buf).contains("Erreur de syntaxe:"));
    }

    #[test]
    fn trailer_is_appended() {
        let buf = SourceBuffer::new("x\n");
        let d = Diagnostic::syntax(ErrorKind::ExpectedFinPour, 0).with_trailer("FinPour");
        let rendered = d.render(&buf);
        assert!(rendered.ends_with("-> FinPour\n"));
    }

    #[test]
    fn sink_preserves_insertion_order() {
        let mut sink = DiagnosticSink::new();
        sink.push(Diagnostic::syntax(ErrorKind::ExpectedFinAlgo, 0));
        sink.push(Diagnostic::syntax(ErrorKind::ExpectedFinSi, 1));
        let messages: Vec<_> = sink.iter().map(|d| d.message.clone()).collect();
        assert_eq!(messages[0], ErrorKind::ExpectedFinAlgo.to_string());
        assert_eq!(messages[1], ErrorKind::ExpectedFinSi.to_string());
    }
}
