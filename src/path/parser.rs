/*!
A `nom`-based parser for the path expression language.

Grammar, roughly:

```text
Path      := ('/' | '//')? Step (('/' | '//') Step)*
Step      := '.' | '..' | NameTest Predicate*
NameTest  := '*' | (Prefix ':')? (LocalName | '*')
Predicate := '[' Expr ']'
Expr      := Integer | '@' NameTest ('=' Quoted)? | 'text()' ('=' Quoted)?
           | Function '()' ('=' Quoted)? | NameTest ('=' Quoted)?
```
*/

use super::{Axis, Filter, NameTest, PathFunction, Segment, Selector};
use crate::error::{invalid_path, trailing_path, PathError};
use nom::branch::alt;
use nom::bytes::complete::{tag, take_while, take_while1};
use nom::character::complete::{char, digit1, multispace0};
use nom::combinator::{map, map_res, opt, recognize};
use nom::multi::many0;
use nom::sequence::{delimited, pair, preceded, separated_pair, terminated};
use nom::IResult;

// ------------------------------------------------------------------------------------------------
// Public (crate) Functions
// ------------------------------------------------------------------------------------------------

pub(crate) fn parse_path(input: &str) -> Result<Vec<Segment>, PathError> {
    if input.is_empty() {
        return Err(PathError::Empty);
    }
    match path(input) {
        Ok(("", segments)) => Ok(segments),
        Ok((remainder, _)) => Err(trailing_path(input, remainder)),
        Err(e) => Err(invalid_path(input, e.to_string())),
    }
}

// ------------------------------------------------------------------------------------------------
// Combinators & Helpers
// ------------------------------------------------------------------------------------------------

fn ws<'a, O, F>(inner: F) -> impl FnMut(&'a str) -> IResult<&'a str, O>
where
    F: nom::Parser<&'a str, O, nom::error::Error<&'a str>>,
{
    delimited(multispace0, inner, multispace0)
}

fn nc_name(input: &str) -> IResult<&str, &str> {
    recognize(pair(
        take_while1(|c: char| c.is_alphabetic() || c == '_'),
        take_while(|c: char| c.is_alphanumeric() || matches!(c, '_' | '-' | '.')),
    ))(input)
}

fn quoted(input: &str) -> IResult<&str, String> {
    map(
        alt((
            delimited(char('\''), take_while(|c| c != '\''), char('\'')),
            delimited(char('"'), take_while(|c| c != '"'), char('"')),
        )),
        |s: &str| s.to_string(),
    )(input)
}

fn eq_quoted(input: &str) -> IResult<&str, String> {
    preceded(ws(char('=')), quoted)(input)
}

// ------------------------------------------------------------------------------------------------
// Name and Predicate Parsers
// ------------------------------------------------------------------------------------------------

fn name_test(input: &str) -> IResult<&str, NameTest> {
    alt((
        map(
            separated_pair(nc_name, char(':'), alt((nc_name, tag("*")))),
            |(prefix, local): (&str, &str)| NameTest {
                prefix: Some(prefix.to_string()),
                local: local.to_string(),
            },
        ),
        map(tag("*"), |_| NameTest {
            prefix: None,
            local: "*".to_string(),
        }),
        map(nc_name, |local: &str| NameTest {
            prefix: None,
            local: local.to_string(),
        }),
    ))(input)
}

fn positional_filter(input: &str) -> IResult<&str, Filter> {
    map_res(digit1, |digits: &str| {
        digits.parse::<usize>().map(Filter::Pos)
    })(input)
}

fn attr_filter(input: &str) -> IResult<&str, Filter> {
    let (input, test) = preceded(char('@'), name_test)(input)?;
    let (input, value) = opt(eq_quoted)(input)?;
    let filter = match value {
        Some(value) => Filter::AttrEq(test, value),
        None => Filter::HasAttr(test),
    };
    Ok((input, filter))
}

fn text_filter(input: &str) -> IResult<&str, Filter> {
    let (input, _) = tag("text()")(input)?;
    let (input, value) = opt(eq_quoted)(input)?;
    let filter = match value {
        Some(value) => Filter::TextEq(value),
        None => Filter::HasText,
    };
    Ok((input, filter))
}

fn function_filter(input: &str) -> IResult<&str, Filter> {
    let (input, function) = terminated(
        alt((
            map(tag("local-name"), |_| PathFunction::LocalName),
            map(tag("namespace-prefix"), |_| PathFunction::NamespacePrefix),
            map(tag("namespace-uri"), |_| PathFunction::NamespaceUri),
            map(tag("name"), |_| PathFunction::Name),
        )),
        tag("()"),
    )(input)?;
    let (input, value) = opt(eq_quoted)(input)?;
    let filter = match value {
        Some(value) => Filter::FuncEq(function, value),
        None => Filter::Func(function),
    };
    Ok((input, filter))
}

fn child_filter(input: &str) -> IResult<&str, Filter> {
    let (input, test) = name_test(input)?;
    let (input, value) = opt(eq_quoted)(input)?;
    let filter = match value {
        Some(value) => Filter::ChildEq(test, value),
        None => Filter::HasChild(test),
    };
    Ok((input, filter))
}

fn predicate(input: &str) -> IResult<&str, Filter> {
    // `text()` and the named functions must be tried before the child test,
    // which would otherwise consume the function name and leave `()` behind.
    delimited(
        char('['),
        ws(alt((
            positional_filter,
            attr_filter,
            text_filter,
            function_filter,
            child_filter,
        ))),
        char(']'),
    )(input)
}

// ------------------------------------------------------------------------------------------------
// Path Parsers
// ------------------------------------------------------------------------------------------------

fn step(input: &str) -> IResult<&str, (Selector, Vec<Filter>)> {
    alt((
        map(tag(".."), |_| (Selector::Parent, Vec::new())),
        map(char('.'), |_| (Selector::Current, Vec::new())),
        map(pair(name_test, many0(predicate)), |(test, filters)| {
            (Selector::Tag(test), filters)
        }),
    ))(input)
}

fn path(input: &str) -> IResult<&str, Vec<Segment>> {
    let (rest, lead) = opt(alt((tag("//"), tag("/"))))(input)?;
    let mut segments = Vec::new();
    let mut first_axis = Axis::Child;
    match lead {
        Some("//") => first_axis = Axis::DescendantOrSelf,
        Some(_) => segments.push(Segment {
            axis: Axis::Child,
            selector: Selector::Root,
            filters: Vec::new(),
        }),
        None => (),
    }
    // a bare `/` selects the root alone
    if lead == Some("/") && rest.is_empty() {
        return Ok((rest, segments));
    }
    let (rest, (selector, filters)) = step(rest)?;
    segments.push(Segment {
        axis: first_axis,
        selector,
        filters,
    });
    let (rest, more) = many0(pair(alt((tag("//"), tag("/"))), step))(rest)?;
    for (separator, (selector, filters)) in more {
        segments.push(Segment {
            axis: if separator == "//" {
                Axis::DescendantOrSelf
            } else {
                Axis::Child
            },
            selector,
            filters,
        });
    }
    Ok((rest, segments))
}

// ------------------------------------------------------------------------------------------------
// Unit Tests
// ------------------------------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn tag_segment(axis: Axis, name: &str, filters: Vec<Filter>) -> Segment {
        Segment {
            axis,
            selector: Selector::Tag(NameTest {
                prefix: None,
                local: name.to_string(),
            }),
            filters,
        }
    }

    #[test]
    fn test_parse_simple_relative_path() {
        let segments = parse_path("foo/bar").expect("parse failed");
        assert_eq!(
            segments,
            vec![
                tag_segment(Axis::Child, "foo", vec![]),
                tag_segment(Axis::Child, "bar", vec![]),
            ]
        );
    }

    #[test]
    fn test_parse_absolute_and_root() {
        let segments = parse_path("/a").expect("parse failed");
        assert_eq!(segments.len(), 2);
        assert_eq!(segments[0].selector, Selector::Root);

        let root_only = parse_path("/").expect("parse failed");
        assert_eq!(root_only.len(), 1);
        assert_eq!(root_only[0].selector, Selector::Root);
    }

    #[test]
    fn test_parse_descendant_axes() {
        let segments = parse_path("//b").expect("parse failed");
        assert_eq!(segments, vec![tag_segment(Axis::DescendantOrSelf, "b", vec![])]);

        let segments = parse_path("a//b").expect("parse failed");
        assert_eq!(
            segments,
            vec![
                tag_segment(Axis::Child, "a", vec![]),
                tag_segment(Axis::DescendantOrSelf, "b", vec![]),
            ]
        );
    }

    #[test]
    fn test_parse_dot_steps() {
        let segments = parse_path("../../b2").expect("parse failed");
        assert_eq!(segments.len(), 3);
        assert_eq!(segments[0].selector, Selector::Parent);
        assert_eq!(segments[1].selector, Selector::Parent);

        let segments = parse_path("./x").expect("parse failed");
        assert_eq!(segments[0].selector, Selector::Current);
    }

    #[test]
    fn test_parse_predicates() {
        let segments = parse_path("book[2]").expect("parse failed");
        assert_eq!(segments[0].filters, vec![Filter::Pos(2)]);

        let segments = parse_path("book[@lang]").expect("parse failed");
        assert_eq!(
            segments[0].filters,
            vec![Filter::HasAttr(NameTest {
                prefix: None,
                local: "lang".to_string()
            })]
        );

        let segments = parse_path("book[@lang='en'][1]").expect("parse failed");
        assert_eq!(
            segments[0].filters,
            vec![
                Filter::AttrEq(
                    NameTest {
                        prefix: None,
                        local: "lang".to_string()
                    },
                    "en".to_string()
                ),
                Filter::Pos(1),
            ]
        );

        let segments = parse_path("book[title='Moby Dick']").expect("parse failed");
        assert_eq!(
            segments[0].filters,
            vec![Filter::ChildEq(
                NameTest {
                    prefix: None,
                    local: "title".to_string()
                },
                "Moby Dick".to_string()
            )]
        );

        let segments = parse_path("p[text()='hi']").expect("parse failed");
        assert_eq!(segments[0].filters, vec![Filter::TextEq("hi".to_string())]);
    }

    #[test]
    fn test_parse_function_predicates() {
        let segments = parse_path("*[namespace-uri()='urn:x']").expect("parse failed");
        assert_eq!(
            segments[0].filters,
            vec![Filter::FuncEq(PathFunction::NamespaceUri, "urn:x".to_string())]
        );

        let segments = parse_path("*[local-name()='b']").expect("parse failed");
        assert_eq!(
            segments[0].filters,
            vec![Filter::FuncEq(PathFunction::LocalName, "b".to_string())]
        );

        let segments = parse_path("*[name()]").expect("parse failed");
        assert_eq!(segments[0].filters, vec![Filter::Func(PathFunction::Name)]);

        // double-quoted literals are accepted too
        let segments = parse_path("*[namespace-prefix()=\"t\"]").expect("parse failed");
        assert_eq!(
            segments[0].filters,
            vec![Filter::FuncEq(PathFunction::NamespacePrefix, "t".to_string())]
        );
    }

    #[test]
    fn test_parse_prefixed_and_wildcard_names() {
        let segments = parse_path("t:title").expect("parse failed");
        assert_eq!(
            segments[0].selector,
            Selector::Tag(NameTest {
                prefix: Some("t".to_string()),
                local: "title".to_string()
            })
        );

        let segments = parse_path("t:*/*").expect("parse failed");
        assert_eq!(
            segments[0].selector,
            Selector::Tag(NameTest {
                prefix: Some("t".to_string()),
                local: "*".to_string()
            })
        );
        assert_eq!(
            segments[1].selector,
            Selector::Tag(NameTest {
                prefix: None,
                local: "*".to_string()
            })
        );
    }

    #[test]
    fn test_parse_errors() {
        assert_eq!(parse_path(""), Err(PathError::Empty));
        assert!(matches!(parse_path("//"), Err(PathError::Invalid { .. })));
        assert!(matches!(
            parse_path("a["),
            Err(PathError::Trailing { .. }) | Err(PathError::Invalid { .. })
        ));
        assert!(matches!(
            parse_path("a]b"),
            Err(PathError::Trailing { .. })
        ));
        assert!(matches!(
            parse_path("a[@]"),
            Err(PathError::Trailing { .. }) | Err(PathError::Invalid { .. })
        ));
    }
}
