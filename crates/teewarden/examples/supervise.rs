//! Demo: a few producer threads report operations while a session
//! supervises them in arbitrate mode.

use std::sync::Arc;
use std::thread;

use teewarden::{
    EventData, InvokeError, Mode, Operation, Param, Plan, Session, TeeSession, TrustedInvoker,
};

/// Pretend trusted context: even operation numbers pass, odd ones fail.
struct ParityJudge;

impl TrustedInvoker for ParityJudge {
    fn invoke(
        &self,
        _session: &TeeSession,
        _command: u32,
        op: &mut Operation,
    ) -> Result<(), InvokeError> {
        match op.params[0] {
            Param::Value { a, .. } if a % 2 == 0 => Ok(()),
            _ => Err(InvokeError::Rejected(0xffff_0006)),
        }
    }
}

fn main() {
    println!("=== teewarden demo ===\n");

    let (reporter, session) = Session::launch(
        Plan::new().mode(Mode::Arbitrate).command(0x10),
        TeeSession { id: 1 },
        Box::new(ParityJudge),
    );

    let producers: Vec<_> = [2, 3, 4, 5]
        .into_iter()
        .map(|nr| {
            let reporter = reporter.clone();
            thread::spawn(move || (nr, reporter.report(Arc::new(EventData::new(nr)))))
        })
        .collect();

    let session = Arc::new(session);
    let runner = {
        let session = session.clone();
        thread::spawn(move || session.run(None))
    };

    for producer in producers {
        let (nr, verdict) = producer.join().unwrap();
        match verdict {
            Ok(v) if v.allowed() => println!("op {nr}: allowed"),
            Ok(v) => println!("op {nr}: denied (errno {})", -v.error),
            Err(e) => println!("op {nr}: error: {e}"),
        }
    }

    session.close();
    match runner.join().unwrap() {
        Ok(handled) => println!("\nsession handled {handled} notifications"),
        Err(e) => eprintln!("\nsession error: {e}"),
    }
}
