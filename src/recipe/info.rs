//   Copyright (c) 2024-2026 Anton Kundenko <singaraiona@gmail.com>
//   All rights reserved.
//
//   Permission is hereby granted, free of charge, to any person obtaining a copy
//   of this software and associated documentation files (the "Software"), to deal
//   in the Software without restriction, including without limitation the rights
//   to use, copy, modify, merge, publish, distribute, sublicense, and/or sell
//   copies of the Software, and to permit persons to whom the Software is
//   furnished to do so, subject to the following conditions:
//
//   The above copyright notice and this permission notice shall be included in all
//   copies or substantial portions of the Software.
//
//   THE SOFTWARE IS PROVIDED "AS IS", WITHOUT WARRANTY OF ANY KIND, EXPRESS OR
//   IMPLIED, INCLUDING BUT NOT LIMITED TO THE WARRANTIES OF MERCHANTABILITY,
//   FITNESS FOR A PARTICULAR PURPOSE AND NONINFRINGEMENT. IN NO EVENT SHALL THE
//   AUTHORS OR COPYRIGHT HOLDERS BE LIABLE FOR ANY CLAIM, DAMAGES OR OTHER
//   LIABILITY, WHETHER IN AN ACTION OF CONTRACT, TORT OR OTHERWISE, ARISING FROM,
//   OUT OF OR IN CONNECTION WITH THE SOFTWARE OR THE USE OR OTHER DEALINGS IN THE
//   SOFTWARE.

//! Consumer-facing package information: include and library directories,
//! library names, preprocessor defines and environment.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::Serialize;

use super::package::vc_lib_dir_name;
use super::{Platform, Recipe, RecipeOptions, Version};
use crate::settings::{Arch, BuildType};

const GUI_COMPONENTS: &[&str] = &[
    "core", "adv", "html", "aui", "xrc", "richtext", "propgrid", "ribbon", "stc", "media",
];

/// Templates for the non-GUI libraries.
fn base_templates(platform: Platform) -> [&'static str; 3] {
    match platform {
        Platform::Windows => [
            "wxbase{version}{unicode}{debug}",
            "wxbase{version}{unicode}{debug}_net",
            "wxbase{version}{unicode}{debug}_xml",
        ],
        Platform::Linux => [
            "wx_base{unicode}{debug}-{version}",
            "wx_base{unicode}{debug}_net-{version}",
            "wx_base{unicode}{debug}_xml-{version}",
        ],
    }
}

fn gui_template(platform: Platform, component: &str) -> String {
    match platform {
        Platform::Windows => format!("wx{{platform}}{{version}}{{unicode}}{{debug}}_{component}"),
        Platform::Linux => format!("wx_{{platform}}{{unicode}}{{debug}}_{component}-{{version}}"),
    }
}

/// Bundled third-party libraries of a static MSVC build.
const MSW_BUNDLED_LIBS: &[&str] = &[
    "wxpng{debug}",
    "wxtiff{debug}",
    "wxjpeg{debug}",
    "wxzlib{debug}",
    "wxregex{unicode}{debug}",
    "wxexpat{debug}",
    "wxscintilla{debug}",
];

const MSW_SYSTEM_LIBS: &[&str] = &[
    "kernel32", "user32", "gdi32", "comdlg32", "winspool", "winmm", "shell32", "shlwapi",
    "comctl32", "ole32", "oleaut32", "uuid", "rpcrt4", "advapi32", "version", "wsock32",
    "wininet", "oleacc", "uxtheme",
];

/// Values substituted into the library name templates.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LibNameTokens {
    pub platform: &'static str,
    pub version: String,
    pub unicode: &'static str,
    pub debug: &'static str,
}

impl LibNameTokens {
    pub fn new(platform: Platform, version: Version, build_type: BuildType) -> Self {
        match platform {
            // wxmsw30ud_core
            Platform::Windows => LibNameTokens {
                platform: "msw",
                version: format!("{}{}", version.major, version.minor),
                unicode: "u",
                debug: if build_type.is_debug() { "d" } else { "" },
            },
            // wx_gtk2u_core-3.0
            Platform::Linux => LibNameTokens {
                platform: "gtk2",
                version: format!("{}.{}", version.major, version.minor),
                unicode: "u",
                debug: "",
            },
        }
    }

    /// Substitute `{platform}`, `{version}`, `{unicode}` and `{debug}`.
    pub fn expand(&self, template: &str) -> String {
        template
            .replace("{platform}", self.platform)
            .replace("{version}", &self.version)
            .replace("{unicode}", self.unicode)
            .replace("{debug}", self.debug)
    }
}

/// Everything a downstream build needs to consume the package.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct PackageInfo {
    pub include_dirs: Vec<PathBuf>,
    pub lib_dirs: Vec<PathBuf>,
    pub bin_dirs: Vec<PathBuf>,
    pub libs: Vec<String>,
    pub defines: Vec<String>,
    pub env: BTreeMap<String, String>,
}

/// Inputs for [`Recipe::package_info`].
#[derive(Clone, Copy, Debug)]
pub struct InfoRequest<'a> {
    pub platform: Platform,
    pub arch: Arch,
    pub build_type: BuildType,
    pub options: RecipeOptions,
    pub version: Version,
    pub package_folder: &'a Path,
}

impl Recipe {
    pub fn package_info(&self, req: &InfoRequest<'_>) -> PackageInfo {
        let tokens = LibNameTokens::new(req.platform, req.version, req.build_type);
        let shared = req.options.shared;
        let debug = req.build_type.is_debug();

        let mut templates: Vec<String> = base_templates(req.platform)
            .iter()
            .map(|t| t.to_string())
            .collect();
        if req.options.use_gui {
            templates.extend(GUI_COMPONENTS.iter().map(|c| gui_template(req.platform, c)));
        }
        if req.platform == Platform::Windows && !shared {
            templates.extend(MSW_BUNDLED_LIBS.iter().map(|t| t.to_string()));
        }
        let mut libs: Vec<String> = templates.iter().map(|t| tokens.expand(t)).collect();

        let lib_dir = match req.platform {
            Platform::Windows => PathBuf::from("lib").join(vc_lib_dir_name(req.arch, shared)),
            Platform::Linux => PathBuf::from("lib"),
        };

        let mut include_dirs = vec![PathBuf::from("include")];
        let mut defines = Vec::new();
        match req.platform {
            Platform::Windows => {
                // setup.h lives next to the libraries
                include_dirs.push(lib_dir.join(format!("msw{}{}", tokens.unicode, tokens.debug)));
                defines.extend(["__WXMSW__", "_UNICODE", "UNICODE"].map(String::from));
                if !shared {
                    libs.extend(MSW_SYSTEM_LIBS.iter().map(|s| s.to_string()));
                }
            }
            Platform::Linux => {
                // configure --disable-shared installs setup.h under a -static dir
                let static_suffix = if shared { "" } else { "-static" };
                include_dirs.push(
                    lib_dir
                        .join("wx")
                        .join("include")
                        .join(format!("gtk2-unicode{}-{}", static_suffix, tokens.version)),
                );
                defines.extend(["__WXGTK__", "_FILE_OFFSET_BITS=64"].map(String::from));
            }
        }
        if shared {
            defines.push("WXUSINGDLL".into());
        }
        if debug {
            defines.push("__WXDEBUG__".into());
        }
        defines.push(format!("wxUSE_GUI={}", u8::from(req.options.use_gui)));

        let mut env = BTreeMap::new();
        env.insert(
            "wxWidgets_ROOT_DIR".to_string(),
            req.package_folder.display().to_string(),
        );
        // consumer PATH entry
        env.insert(
            "PATH".to_string(),
            req.package_folder.join("bin").display().to_string(),
        );

        PackageInfo {
            include_dirs,
            lib_dirs: vec![lib_dir],
            bin_dirs: vec![PathBuf::from("bin")],
            libs,
            defines,
            env,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const V303: Version = Version {
        major: 3,
        minor: 0,
        release: 3,
    };

    fn request(platform: Platform, build_type: BuildType, shared: bool) -> InfoRequest<'static> {
        InfoRequest {
            platform,
            arch: Arch::X86_64,
            build_type,
            options: RecipeOptions {
                shared,
                use_gui: true,
            },
            version: V303,
            package_folder: Path::new("/pkg"),
        }
    }

    #[test]
    fn msw_names() {
        let t = LibNameTokens::new(Platform::Windows, V303, BuildType::Debug);
        let [base, net, _] = base_templates(Platform::Windows);
        assert_eq!(t.expand(base), "wxbase30ud");
        assert_eq!(t.expand(net), "wxbase30ud_net");
        assert_eq!(t.expand(&gui_template(Platform::Windows, "core")), "wxmsw30ud_core");
        assert_eq!(t.expand("wxregex{unicode}{debug}"), "wxregexud");
    }

    #[test]
    fn gtk_names() {
        let t = LibNameTokens::new(Platform::Linux, V303, BuildType::Debug);
        let [_, _, xml] = base_templates(Platform::Linux);
        assert_eq!(t.expand(xml), "wx_baseu_xml-3.0");
        assert_eq!(t.expand(&gui_template(Platform::Linux, "core")), "wx_gtk2u_core-3.0");
    }

    #[test]
    fn windows_shared_release() {
        let info = Recipe::default().package_info(&request(Platform::Windows, BuildType::Release, true));
        assert_eq!(info.lib_dirs, [PathBuf::from("lib").join("vc_x64_dll")]);
        assert!(info.include_dirs.contains(&PathBuf::from("lib").join("vc_x64_dll").join("mswu")));
        assert!(info.libs.contains(&"wxmsw30u_core".to_string()));
        assert!(!info.libs.iter().any(|l| l.starts_with("wxpng")));
        assert!(info.defines.contains(&"WXUSINGDLL".to_string()));
        assert!(!info.defines.contains(&"__WXDEBUG__".to_string()));
        assert_eq!(info.env["wxWidgets_ROOT_DIR"], Path::new("/pkg").display().to_string());
        assert_eq!(info.env["PATH"], Path::new("/pkg").join("bin").display().to_string());
    }

    #[test]
    fn windows_static_debug_links_bundled_and_system_libs() {
        let info = Recipe::default().package_info(&request(Platform::Windows, BuildType::Debug, false));
        assert!(info.libs.contains(&"wxpngd".to_string()));
        assert!(info.libs.contains(&"comctl32".to_string()));
        assert!(info.defines.contains(&"__WXDEBUG__".to_string()));
        assert!(!info.defines.contains(&"WXUSINGDLL".to_string()));
    }

    #[test]
    fn linux_setup_h_dir_follows_link_mode() {
        let setup_dir = |shared| {
            Recipe::default()
                .package_info(&request(Platform::Linux, BuildType::Release, shared))
                .include_dirs[1]
                .clone()
        };
        assert_eq!(setup_dir(true), Path::new("lib/wx/include/gtk2-unicode-3.0"));
        assert_eq!(setup_dir(false), Path::new("lib/wx/include/gtk2-unicode-static-3.0"));
    }

    #[test]
    fn without_gui_only_base_libs() {
        let mut req = request(Platform::Linux, BuildType::Release, true);
        req.options.use_gui = false;
        let info = Recipe::default().package_info(&req);
        assert_eq!(info.libs, ["wx_baseu-3.0", "wx_baseu_net-3.0", "wx_baseu_xml-3.0"]);
        assert!(info.defines.contains(&"wxUSE_GUI=0".to_string()));
        assert_eq!(info.defines[0], "__WXGTK__");
    }
}
