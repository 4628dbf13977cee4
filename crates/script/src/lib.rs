//! Sandboxed interpreter for the code embedded in snippet bodies.
//!
//! Snippet blocks are written in a small JavaScript-flavoured statement
//! language. Programs are parsed once when a definition file is compiled and
//! evaluated by a tree-walking [`Interpreter`] that has no access to the file
//! system, the network, or the host process.
//!
//! # Supported language
//!
//! * declarations (`let`, `const`, `var`), assignment and compound assignment
//! * `if`/`else`, `while`, C-style `for`, `for (x of xs)`, `break`, `continue`
//! * function declarations, arrow functions and lexical closures
//! * number, string, template string, boolean, `null`, `undefined` and array values
//! * string and array methods, `Math.*`, `String`, `Number`, `parseInt`,
//!   `parseFloat`, `isNaN`, `console.log` and the `now(format)` date helper
//!
//! Objects, classes, regex literals, `new`, exceptions and modules are not
//! available. Evaluation is bounded by [`ScriptLimits`].

pub mod ast;
pub mod error;
pub mod interp;
pub mod lexer;
pub mod limits;
pub mod parser;
pub mod value;

pub use ast::Program;
pub use error::{Result, ScriptError};
pub use interp::{Interpreter, Scope};
pub use limits::ScriptLimits;
pub use parser::{parse_expression, parse_program};
pub use value::Value;
