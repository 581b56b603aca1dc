// Graph spec parser
//
// Accepted forms:
//   User vs Likes
//   Year vs Likes
//   bar(x: App, y: Likes)
//   scatter(x: Year, y: "Usage Duration")
//   pie(x: Country)
//   histogram(x: Likes)

use super::lexer::{identifier, string_literal, ws};
use crate::selection::{ChartKind, GraphConfig, PresetGraph};
use anyhow::anyhow;
use nom::{
    branch::alt,
    bytes::complete::tag,
    character::complete::char,
    combinator::{all_consuming, opt, value},
    error::{Error, ErrorKind},
    sequence::preceded,
    IResult,
};

/// Parse one graph spec, preset or custom
pub fn parse_graph_config(input: &str) -> IResult<&str, GraphConfig> {
    alt((parse_custom, parse_preset))(input)
}

/// Parse a complete graph spec, rejecting trailing input
pub fn parse_graph(input: &str) -> anyhow::Result<GraphConfig> {
    match all_consuming(parse_graph_config)(input) {
        Ok((_, config)) => Ok(config),
        Err(e) => Err(anyhow!("Invalid graph spec '{}': {:?}", input, e)),
    }
}

fn column(input: &str) -> IResult<&str, String> {
    alt((string_literal, identifier))(input)
}

fn chart_kind(input: &str) -> IResult<&str, ChartKind> {
    alt((
        value(ChartKind::Bar, tag("bar")),
        value(ChartKind::Pie, tag("pie")),
        value(ChartKind::Scatter, tag("scatter")),
        value(ChartKind::Histogram, tag("histogram")),
    ))(input)
}

/// Format: kind(x: col) or kind(x: col, y: col)
fn parse_custom(input: &str) -> IResult<&str, GraphConfig> {
    let (input, kind) = ws(chart_kind)(input)?;
    let (input, _) = ws(char('('))(input)?;

    let (input, _) = ws(tag("x:"))(input)?;
    let (input, x) = ws(column)(input)?;

    let (input, y) = opt(preceded(
        ws(char(',')),
        preceded(ws(tag("y:")), ws(column)),
    ))(input)?;

    let (input, _) = ws(char(')'))(input)?;

    Ok((input, GraphConfig::custom(kind, x, y)))
}

/// Format: <x> vs <y>, limited to the known presets
fn parse_preset(input: &str) -> IResult<&str, GraphConfig> {
    let (rest, x) = ws(identifier)(input)?;
    let (rest, _) = tag("vs")(rest)?;
    let (rest, y) = ws(identifier)(rest)?;

    match PresetGraph::from_label(&format!("{} vs {}", x, y)) {
        Some(preset) => Ok((rest, GraphConfig::Preset(preset))),
        None => Err(nom::Err::Error(Error::new(input, ErrorKind::Verify))),
    }
}
