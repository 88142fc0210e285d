//! TSX/TS parsing via SWC.

use swc_common::{BytePos, FileName, SourceMap, Spanned};
use swc_ecma_ast::Module;
use swc_ecma_parser::{Parser, StringInput, Syntax, TsSyntax};

use crate::issues::SourceContext;

/// A parsed source file with its source map for location lookups.
pub struct ParsedSource {
    pub module: Module,
    pub source_map: SourceMap,
}

impl std::fmt::Debug for ParsedSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ParsedSource")
            .field("module", &self.module)
            .finish_non_exhaustive()
    }
}

/// A parse failure with the location SWC reported.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseFailure {
    pub message: String,
    pub line: usize,
    pub col: usize,
}

/// Parse TSX/TS source text into an AST.
///
/// All file extensions are parsed with the TSX syntax; plain TS/JS files are
/// a subset for every construct the engine looks at.
pub fn parse_source(code: &str, file_path: &str) -> Result<ParsedSource, ParseFailure> {
    let source_map = SourceMap::default();
    let source_file =
        source_map.new_source_file(FileName::Real(file_path.into()).into(), code.to_string());

    let syntax = Syntax::Typescript(TsSyntax {
        tsx: true,
        ..Default::default()
    });
    let mut parser = Parser::new(syntax, StringInput::from(&*source_file), None);
    let module = parser.parse_module().map_err(|e| {
        let loc = source_map.lookup_char_pos(e.span().lo);
        ParseFailure {
            message: e.into_kind().msg().to_string(),
            line: loc.line,
            col: loc.col_display + 1,
        }
    })?;
    Ok(ParsedSource { module, source_map })
}

/// Build a `SourceContext` for a position in a parsed file, recovering the
/// source line for caret display.
pub(crate) fn context_at(source_map: &SourceMap, file_path: &str, pos: BytePos) -> SourceContext {
    let loc = source_map.lookup_char_pos(pos);
    let source_line = loc
        .file
        .get_line(loc.line - 1)
        .map(|cow| cow.to_string())
        .unwrap_or_default();
    SourceContext::new(file_path, loc.line, loc.col_display + 1, source_line)
}
