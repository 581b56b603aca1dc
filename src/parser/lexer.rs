// Shared tokens for the graph spec parser

use nom::{
    branch::alt,
    bytes::complete::{tag, take_while},
    character::complete::{alpha1, alphanumeric1, char, multispace0},
    combinator::{map, recognize},
    multi::many0,
    sequence::{delimited, pair},
    IResult,
};

/// Wrap a parser so it skips surrounding whitespace
pub fn ws<'a, F, O>(inner: F) -> impl FnMut(&'a str) -> IResult<&'a str, O>
where
    F: FnMut(&'a str) -> IResult<&'a str, O>,
{
    delimited(multispace0, inner, multispace0)
}

/// Bare column name: letter or underscore, then letters, digits, underscores
pub fn identifier(input: &str) -> IResult<&str, String> {
    map(
        recognize(pair(
            alt((alpha1, tag("_"))),
            many0(alt((alphanumeric1, tag("_")))),
        )),
        String::from,
    )(input)
}

/// Double-quoted text, no escapes
pub fn string_literal(input: &str) -> IResult<&str, String> {
    map(
        delimited(char('"'), take_while(|c| c != '"'), char('"')),
        String::from,
    )(input)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identifier() {
        assert_eq!(identifier("time_spent)"), Ok((")", "time_spent".to_string())));
        assert!(identifier("9lives").is_err());
    }

    #[test]
    fn test_string_literal() {
        assert_eq!(
            string_literal("\"Usage Duration\" rest"),
            Ok((" rest", "Usage Duration".to_string()))
        );
        assert!(string_literal("\"open").is_err());
    }

    #[test]
    fn test_ws() {
        let result = ws(identifier)("   App  ,");
        assert_eq!(result, Ok((",", "App".to_string())));
    }
}
