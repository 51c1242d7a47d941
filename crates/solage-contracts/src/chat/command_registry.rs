#[derive(Clone, Copy, Debug)]
pub(crate) struct CommandSpec {
    pub command: &'static str,
    pub action: &'static str,
}

/// Commands whose argument is a catalog or option id, stored under `id`.
pub(crate) const CHOICE_COMMANDS: &[CommandSpec] = &[
    CommandSpec {
        command: "product",
        action: "choose_product",
    },
    CommandSpec {
        command: "angle",
        action: "choose_angle",
    },
    CommandSpec {
        command: "network",
        action: "choose_network",
    },
    CommandSpec {
        command: "tone",
        action: "choose_tone",
    },
    CommandSpec {
        command: "visual",
        action: "choose_visual",
    },
    CommandSpec {
        command: "category",
        action: "set_category",
    },
];

pub(crate) const RAW_ARG_COMMANDS: &[CommandSpec] = &[
    CommandSpec {
        command: "text_model",
        action: "set_text_model",
    },
    CommandSpec {
        command: "image_model",
        action: "set_image_model",
    },
    CommandSpec {
        command: "search",
        action: "search",
    },
];

pub(crate) const NO_ARG_COMMANDS: &[CommandSpec] = &[
    CommandSpec {
        command: "connect",
        action: "connect",
    },
    CommandSpec {
        command: "start",
        action: "start",
    },
    CommandSpec {
        command: "back",
        action: "back",
    },
    CommandSpec {
        command: "camera",
        action: "open_camera",
    },
    CommandSpec {
        command: "capture",
        action: "capture_photo",
    },
    CommandSpec {
        command: "cancel",
        action: "cancel_camera",
    },
    CommandSpec {
        command: "trends",
        action: "research_trends",
    },
    CommandSpec {
        command: "generate",
        action: "generate",
    },
    CommandSpec {
        command: "regenerate",
        action: "regenerate",
    },
    CommandSpec {
        command: "new",
        action: "reset",
    },
    CommandSpec {
        command: "status",
        action: "status",
    },
    CommandSpec {
        command: "help",
        action: "help",
    },
];

pub(crate) const EXPORT_COMMAND: CommandSpec = CommandSpec {
    command: "export",
    action: "export",
};

pub const STUDIO_HELP_COMMANDS: &[&str] = &[
    "/connect",
    "/start",
    "/search",
    "/category",
    "/product",
    "/angle",
    "/trends",
    "/network",
    "/tone",
    "/visual",
    "/camera",
    "/capture",
    "/cancel",
    "/generate",
    "/regenerate",
    "/back",
    "/new",
    "/export",
    "/status",
    "/text_model",
    "/image_model",
    "/help",
];
