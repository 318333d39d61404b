use calculate::{checker, lexer, postfix, Expression, IntoVariables, BUILTINS};
use clap::Parser;
use miette::{LabeledSpan, NamedSource};

#[derive(Parser, Debug)]
#[command(version, about, long_about = None, allow_negative_numbers = true)]
struct Input {
    /// The expression to evaluate, e.g. "2 * sin(x) + 1"
    expression: String,

    /// One value per declared variable, in declaration order
    values: Vec<f64>,

    /// Comma-separated variable names, e.g. "x, y"
    #[clap(long, default_value = "")]
    vars: String,

    /// Fold constant subexpressions once, before evaluating. Only safe when every function is pure.
    #[clap(long, default_value = "false")]
    optimize: bool,

    /// Debug the lexer, printing out each token. Does not evaluate the expression.
    #[clap(long, default_value = "false")]
    debug_lexer: bool,

    /// Debug the converter, printing out the postfix form. Does not evaluate the expression.
    #[clap(long, default_value = "false")]
    debug_postfix: bool,

    /// Debug the compiler, printing out the tree (folded with --optimize). Does not evaluate the expression.
    #[clap(long, default_value = "false")]
    debug_tree: bool,
}

fn main() {
    let Input {
        expression,
        values,
        vars,
        optimize,
        debug_lexer,
        debug_postfix,
        debug_tree,
    } = Input::parse();

    let source_code = NamedSource::new("<expression>", expression.clone());
    let variables = vars.as_str().into_variables();

    if debug_lexer {
        run_debug_lexer(&expression, &variables, source_code);
        return;
    }

    if debug_postfix {
        run_debug_postfix(&expression, &variables, source_code);
        return;
    }

    let mut compiled = match Expression::new(&expression, variables) {
        Ok(compiled) if optimize => compiled.optimized(),
        Ok(compiled) => compiled,
        Err(e) => fail(e, source_code),
    };

    if debug_tree {
        println!("{}", compiled.tree());
        return;
    }

    match compiled.evaluate_with(&values) {
        Ok(result) => println!("{result}"),
        Err(e) => fail(e, source_code),
    }
}

fn fail(error: calculate::Error, source_code: NamedSource<String>) -> ! {
    eprintln!("{:?}", miette::Report::new(error).with_source_code(source_code));
    std::process::exit(1);
}

fn run_debug_lexer(source: &str, variables: &[String], source_code: NamedSource<String>) {
    for token in lexer::Lexer::new(source, variables, &BUILTINS) {
        match token {
            Ok(t) => {
                let diag = miette::miette!(
                    labels = vec![LabeledSpan::at(t.span.start..t.span.end, t.kind.to_string())],
                    severity = miette::Severity::Advice,
                    "found a token",
                )
                .with_source_code(source_code.clone());
                eprintln!("{:?}", diag);
            }
            Err(e) => fail(e, source_code),
        }
    }
}

fn run_debug_postfix(source: &str, variables: &[String], source_code: NamedSource<String>) {
    let postfix = lexer::tokenize(source, variables, &BUILTINS)
        .and_then(checker::check)
        .and_then(postfix::to_postfix);

    match postfix {
        Ok(tokens) => {
            let texts: Vec<&str> = tokens.iter().map(|t| t.text(source)).collect();
            println!("{}", texts.join(" "));
        }
        Err(e) => fail(e, source_code),
    }
}
