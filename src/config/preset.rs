// src/config/preset.rs

//! Starter configs for the backend setups people most often wrap.

use clap::ValueEnum;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Preset {
    /// Python (FastAPI) backend serving a Next.js frontend.
    PythonNextjs,
    /// Node.js (Express) backend with a React dev server.
    NodeReact,
    /// A shell script that starts everything.
    ShellScript,
    /// `npm run dev` wrapped in a shell script.
    NpmScript,
}

struct PresetValues {
    comment: &'static str,
    command: &'static str,
    script: &'static str,
    port: u16,
    startup_timeout: &'static str,
}

impl Preset {
    pub fn all() -> [Preset; 4] {
        [
            Preset::PythonNextjs,
            Preset::NodeReact,
            Preset::ShellScript,
            Preset::NpmScript,
        ]
    }

    fn values(self) -> PresetValues {
        match self {
            Preset::PythonNextjs => PresetValues {
                comment: "Python FastAPI backend + Next.js frontend",
                command: "python3",
                script: "backend/main.py",
                port: 3000,
                startup_timeout: "30s",
            },
            Preset::NodeReact => PresetValues {
                comment: "Node.js Express backend + React frontend",
                command: "node",
                script: "backend/server.js",
                port: 5173,
                startup_timeout: "30s",
            },
            Preset::ShellScript => PresetValues {
                comment: "Shell script that starts everything",
                command: "bash",
                script: "start-all.sh",
                port: 8000,
                startup_timeout: "45s",
            },
            Preset::NpmScript => PresetValues {
                comment: "npm script; start-dev.sh runs `cd <project> && npm run dev`",
                command: "bash",
                script: "start-dev.sh",
                port: 3000,
                startup_timeout: "60s",
            },
        }
    }

    /// Render the preset as a `Launcher.toml` document.
    pub fn to_toml(self) -> String {
        let v = self.values();
        format!(
            "# {comment}\n\
             [backend]\n\
             command = \"{command}\"\n\
             script = \"{script}\"\n\
             \n\
             [readiness]\n\
             port = {port}\n\
             startup_timeout = \"{timeout}\"\n\
             \n\
             [shutdown]\n\
             grace_period = \"5s\"\n\
             \n\
             [frontend]\n\
             url = \"http://localhost:{port}\"\n",
            comment = v.comment,
            command = v.command,
            script = v.script,
            port = v.port,
            timeout = v.startup_timeout,
        )
    }
}
