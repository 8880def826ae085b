use crate::{cdb::Debugger, Error};

/// A pattern expected in the output, and what it proves.
#[derive(Debug, Clone)]
pub struct Check {
    pub pattern: String,
    pub label: &'static str,
}

/// Checks run in order against the output of a single debugger command.
#[derive(Debug, Clone)]
pub struct CheckGroup {
    pub command: &'static str,
    pub checks: Vec<Check>,
}

impl CheckGroup {
    fn new(command: &'static str) -> Self {
        Self {
            command,
            checks: Vec::new(),
        }
    }

    fn expect(mut self, pattern: impl Into<String>, label: &'static str) -> Self {
        self.checks.push(Check {
            pattern: pattern.into(),
            label,
        });
        self
    }
}

/// Everything that should be visible in the dump of a `crashy_program` that
/// was connected to the handler over `pipe_name`.
pub fn crash_scenario(pipe_name: &str) -> Vec<CheckGroup> {
    vec![
        CheckGroup::new(".ecxr")
            .expect(
                "This dump file has an exception of interest stored in it",
                "captured exception",
            )
            .expect(
                r"crashy_program!crashpad::`anonymous namespace'::SomeCrashyFunction",
                "exception at correct location",
            ),
        CheckGroup::new("!peb")
            .expect(r"PEB at", "found the PEB")
            .expect(r"Ldr\.InMemoryOrderModuleList:.*\d+ \. \d+", "PEB_LDR_DATA saved")
            .expect(r"Base TimeStamp                     Module", "module list present")
            .expect(
                format!(
                    r"CommandLine: *'.*crashy_program.exe *{}",
                    regex::escape(pipe_name)
                ),
                "some PEB data is correct",
            )
            .expect(r"SystemRoot=C:\\Windows", "some of environment captured"),
        CheckGroup::new("!teb")
            .expect(r"TEB at", "found the TEB")
            .expect(r"ExceptionList:\s+[0-9a-fA-F]+", "some valid teb data")
            .expect(r"LastErrorValue:\s+2", "correct LastErrorValue"),
        CheckGroup::new("!gle")
            .expect(
                r"LastErrorValue: \(Win32\) 0x2 \(2\) - The system cannot find the file specified\.",
                "!gle gets last error",
            )
            .expect(
                r"LastStatusValue: \(NTSTATUS\) 0xc000000f - \{File Not Found\}  The file %hs does not exist\.",
                "!gle gets last ntstatus",
            ),
    ]
}

/// Runs each group in a fresh debugger session so output from one command
/// can't satisfy another group's checks. Stops at the first failure.
pub fn run_groups(debugger: &impl Debugger, groups: &[CheckGroup]) -> Result<(), Error> {
    for group in groups {
        let mut run = debugger.run(group.command)?;
        for check in &group.checks {
            run.check(&check.pattern, check.label)?;
        }
    }
    Ok(())
}

pub fn run_tests(debugger: &impl Debugger, pipe_name: &str) -> Result<(), Error> {
    run_groups(debugger, &crash_scenario(pipe_name))
}
