//! The Module Assembler: merges the generated dispatcher body with the
//! static runtime catalogue (closed under dependency) and a fixed module
//! preamble into one complete WAST module string.

use std::collections::BTreeSet;

use crate::catalogue;
use crate::config::Config;
use crate::opcode::OpKind;

/// Stack layout constants from §6: 1024 slots of 32 bytes, `$sp` initially
/// one slot below the first (empty stack sentinel).
const STACK_SLOTS: i32 = 1024;
const STACK_POINTER_EMPTY: i32 = -32;

pub fn assemble(
    main_body: &str,
    opcodes_used: &BTreeSet<OpKind>,
    callback_table: &[String],
    stack_trace: bool,
    config: &Config,
) -> String {
    let used: Vec<OpKind> = opcodes_used.iter().copied().collect();
    let closure = catalogue::dependency_closure(&used);

    let mut functions = String::new();
    let mut imports = String::new();

    imports.push_str("(import \"ethereum\" \"useGas\" (func $useGas (param i64)))\n");
    if stack_trace {
        imports.push_str("(import \"debug\" \"printMemHex\" (func $printMemHex (param i32 i32)))\n");
        imports.push_str("(import \"debug\" \"print\" (func $print (param i64)))\n");
        imports.push_str(
            "(import \"debug\" \"evmTrace\" (func $stackTrace (param i32 i32 i64 i32)))\n",
        );
    }

    for kind in &closure {
        if let Some(snippet) = catalogue::snippet(*kind) {
            if !snippet.imports.is_empty() {
                imports.push_str(snippet.imports);
                imports.push('\n');
            }
            functions.push_str(snippet.wast);
            functions.push('\n');
        }
    }

    let callback_table_decl = if callback_table.is_empty() {
        String::new()
    } else {
        let elems = callback_table.join(" ");
        format!(
            "(table (export \"callback\") anyfunc (elem {}))\n",
            elems
        )
    };

    format!(
        "(module\n{imports}\
         (memory (export \"memory\") {pages})\n\
         (global $cb_dest (mut i32) (i32.const 0))\n\
         (global $sp (mut i32) (i32.const {sp_init}))\n\
         (global $init (mut i32) (i32.const 0))\n\
         (global $memstart (mut i32) (i32.const 33832))\n\
         (global $wordCount (mut i32) (i32.const 0))\n\
         (global $prevMemCost (mut i32) (i32.const 0))\n\
         {callback_table_decl}\
         {functions}\
         (func $main (export \"main\") (local $jump_dest i32)\n\
           (set_local $jump_dest (i32.const -1))\n\
           {main_body}\n\
         )\n\
         )",
        imports = imports,
        pages = config.memory_initial_pages,
        sp_init = STACK_POINTER_EMPTY,
        callback_table_decl = callback_table_decl,
        functions = functions,
        main_body = main_body,
    )
}

/// Reports whether a given stack slot count is consistent with the fixed
/// 1024-slot layout this assembler emits; used by tests and by
/// `Config::default` as a sanity companion rather than a runtime check.
pub fn max_stack_slots() -> i32 {
    STACK_SLOTS
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::translate;

    #[test]
    fn assembles_module_with_memory_and_main() {
        let out = translate(&[0x00], false, false);
        let body = crate::linker::link(&out.chunks, &out.segments);
        let text = assemble(&body, &out.opcodes_used, &out.callback_table, false, &Config::default());
        assert!(text.starts_with("(module"));
        assert!(text.contains("(memory (export \"memory\") 500)"));
        assert!(text.contains("(func $main (export \"main\")"));
        assert!(text.ends_with(")"));
    }

    #[test]
    fn includes_dependency_closure_for_mul() {
        let out = translate(&[0x60, 0x02, 0x60, 0x03, 0x02, 0x00], false, false);
        let body = crate::linker::link(&out.chunks, &out.segments);
        let text = assemble(&body, &out.opcodes_used, &out.callback_table, false, &Config::default());
        assert!(text.contains("$mul_256"));
        assert!(text.contains("$check_overflow"));
        assert!(text.contains("$MUL"));
    }

    #[test]
    fn stack_trace_pulls_in_debug_imports() {
        let out = translate(&[0x00], true, false);
        let body = crate::linker::link(&out.chunks, &out.segments);
        let text = assemble(&body, &out.opcodes_used, &out.callback_table, true, &Config::default());
        assert!(text.contains("\"evmTrace\""));
    }
}
