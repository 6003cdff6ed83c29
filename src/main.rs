//! Throws exceptions on request, so their effect on the process can be
//! observed from outside.
//!
//! ```text
//! uwucatch uncaught <code>   throw with no region at all
//! uwucatch rethrown <code>   throw in a region whose clauses don't match
//! uwucatch run <code>        throw under the `run` driver
//! uwucatch caught <code>     throw and catch
//! uwucatch workers <n>       n workers, every other one dies uncaught
//! ```

use std::process::ExitCode;

use uwucatch::{throw, ThreadIdentity};

fn main() -> ExitCode {
    uwucatch::designate_main_thread(ThreadIdentity::current());

    let args: Vec<String> = std::env::args().skip(1).collect();
    let (scenario, number) = match args.as_slice() {
        [scenario, number] => match number.parse::<i32>() {
            Ok(number) => (scenario.as_str(), number),
            Err(err) => return usage(&format!("invalid number {number:?}: {err}")),
        },
        _ => return usage("expected a scenario and a number"),
    };

    match scenario {
        "uncaught" => {
            throw!(number, "Uncaught exception");
        }
        "rethrown" => {
            uwucatch::r#try(|| throw!(number, "Rethrown exception"))
                .catch(number.wrapping_add(1), |_| ())
                .end();
        }
        "run" => uwucatch::run(|| {
            throw!(number, "Exception under run");
        }),
        "caught" => {
            let code = uwucatch::r#try(|| throw!(number, "Caught exception"))
                .catch(number, |exception| exception.code())
                .end();
            println!("caught {code}");
        }
        "workers" => workers(number),
        other => return usage(&format!("unknown scenario {other:?}")),
    }

    ExitCode::SUCCESS
}

fn workers(count: i32) {
    let handles: Vec<_> = (0..count)
        .map(|id| {
            uwucatch::thread::spawn(move || {
                if id % 2 == 0 {
                    throw!(50 + id, "Thread {id} uncaught exception");
                }
            })
        })
        .collect();

    for (id, handle) in (0..count).zip(handles) {
        match handle.join() {
            Ok(()) => println!("worker {id}: ok"),
            Err(uncaught) => println!("worker {id}: code {}", uncaught.code()),
        }
    }
}

fn usage(problem: &str) -> ExitCode {
    eprintln!("{problem}");
    eprintln!("usage: uwucatch <uncaught|rethrown|run|caught|workers> <number>");
    ExitCode::from(64)
}
