use winnow::ascii::{multispace1, Caseless};
use winnow::combinator::{alt, cut_err, delimited, eof, opt, preceded, terminated};
use winnow::error::{ModalResult, StrContext, StrContextValue};
use winnow::prelude::*;
use winnow::token::{rest, take_till};

use super::parser::{InstructionLine, ScriptLine};

const MAX_PARAMS: usize = 4;

// -- Directives & comments --------------------------------------------------

fn blank(input: &mut &str) -> ModalResult<ScriptLine> {
    alt((eof.void(), preceded('#', rest).void()))
        .value(ScriptLine::Blank)
        .parse_next(input)
}

fn include(input: &mut &str) -> ModalResult<ScriptLine> {
    delimited(Caseless(".include<"), take_till(0.., '>'), '>')
        .verify(|path: &str| !path.trim().is_empty())
        .map(|path: &str| ScriptLine::Include(path.trim().to_owned()))
        .parse_next(input)
}

fn other_directive(input: &mut &str) -> ModalResult<ScriptLine> {
    preceded('.', rest).value(ScriptLine::Blank).parse_next(input)
}

// -- Statements -------------------------------------------------------------

fn params<'i>(input: &mut &'i str) -> ModalResult<&'i str> {
    preceded(
        '(',
        terminated(
            take_till(0.., ')'),
            cut_err(')').context(StrContext::Expected(StrContextValue::CharLiteral(')'))),
        ),
    )
    .parse_next(input)
}

fn return_keyword(input: &mut &str) -> ModalResult<bool> {
    opt(terminated("return", alt((multispace1, eof))))
        .map(|kw| kw.is_some())
        .parse_next(input)
}

fn statement(input: &mut &str) -> ModalResult<ScriptLine> {
    let command = take_till(0.., '(').parse_next(input)?.trim().to_ascii_lowercase();
    let params = opt(params)
        .parse_next(input)?
        .map(str::to_ascii_lowercase)
        .unwrap_or_default();
    let action = rest.parse_next(input)?.trim().to_ascii_lowercase();

    match command.as_str() {
        "function" => return Ok(ScriptLine::Function(params.trim().to_owned())),
        "end" => return Ok(ScriptLine::End),
        _ => {}
    }

    let mut action_input = action.as_str();
    let return_after_action = return_keyword.parse_next(&mut action_input)?;

    Ok(ScriptLine::Instruction(InstructionLine {
        command,
        params: params
            .split(',')
            .take(MAX_PARAMS)
            .map(|p| p.trim().to_owned())
            .collect(),
        action: action_input.trim().to_owned(),
        return_after_action,
    }))
}

// -- Top-level parser -------------------------------------------------------

pub fn script_line(input: &mut &str) -> ModalResult<ScriptLine> {
    alt((blank, include, other_directive, statement)).parse_next(input)
}

#[cfg(test)]
mod tests {
    use crate::parse::parse_line;

    use super::*;

    fn instruction(line: &str) -> InstructionLine {
        match parse_line(line).unwrap() {
            ScriptLine::Instruction(i) => i,
            other => panic!("expected instruction, got {other:?}"),
        }
    }

    #[test]
    fn blank_and_comment_lines() {
        assert_eq!(parse_line("").unwrap(), ScriptLine::Blank);
        assert_eq!(parse_line("   ").unwrap(), ScriptLine::Blank);
        assert_eq!(parse_line("# if(true) setblock").unwrap(), ScriptLine::Blank);
    }

    #[test]
    fn include_keeps_path_case() {
        assert_eq!(
            parse_line("  .Include</etc/Story/common.story>").unwrap(),
            ScriptLine::Include("/etc/Story/common.story".into())
        );
    }

    #[test]
    fn other_directives_are_ignored() {
        assert_eq!(parse_line(".define(x)").unwrap(), ScriptLine::Blank);
        assert_eq!(parse_line(".include<>").unwrap(), ScriptLine::Blank);
    }

    #[test]
    fn function_and_end() {
        assert_eq!(
            parse_line("function( CheckSite )").unwrap(),
            ScriptLine::Function("checksite".into())
        );
        assert_eq!(parse_line("end()").unwrap(), ScriptLine::End);
        assert_eq!(parse_line("END").unwrap(), ScriptLine::End);
    }

    #[test]
    fn instruction_fields() {
        let line = instruction("If( SiteIn , BannedSite, 500, 501 ) setBlock");
        assert_eq!(line.command, "if");
        assert_eq!(line.params, ["sitein", "bannedsite", "500", "501"]);
        assert_eq!(line.action, "setblock");
        assert!(!line.return_after_action);
        assert_eq!(line.param(4), "");
    }

    #[test]
    fn return_prefix() {
        let line = instruction("ifnot(true) return   setexception");
        assert_eq!(line.command, "ifnot");
        assert!(line.return_after_action);
        assert_eq!(line.action, "setexception");
    }

    #[test]
    fn bare_return_has_empty_action() {
        let line = instruction("if(true) return");
        assert!(line.return_after_action);
        assert_eq!(line.action, "");
    }

    #[test]
    fn return_must_be_a_whole_word() {
        let line = instruction("if(true) returnflag");
        assert!(!line.return_after_action);
        assert_eq!(line.action, "returnflag");
    }

    #[test]
    fn fields_past_the_fourth_are_ignored() {
        let line = instruction("if(sitein,list,1,2,3)");
        assert_eq!(line.params, ["sitein", "list", "1", "2"]);
    }

    #[test]
    fn unknown_commands_are_still_instructions() {
        assert_eq!(instruction("iff(true) setblock").command, "iff");
    }

    #[test]
    fn unclosed_params_fail() {
        let err = parse_line("if(sitein, list setblock").unwrap_err();
        assert!(err.column() > 1);
        assert!(err.to_string().starts_with("malformed line"));
    }
}
