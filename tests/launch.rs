#![cfg(unix)]

use std::fs::File;
use std::io::Write;
use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};

use modlaunch_lib::core::error::LauncherError;
use modlaunch_lib::core::launch::natives::NATIVES_FOLDER;
use modlaunch_lib::core::launch::{LaunchEvent, LaunchHandle, LaunchOrchestrator, LaunchRequest};
use modlaunch_lib::core::version::RuleContext;
use zip::write::SimpleFileOptions;

/// Prints every argument on stdout and lists the natives directory on stderr.
const ECHO_JAVA: &str = r#"#!/bin/sh
for arg in "$@"; do
  echo "$arg"
  case "$arg" in
    -Djava.library.path=*) ls "${arg#-Djava.library.path=}" 1>&2 ;;
  esac
done
exit 0
"#;

const SLOW_JAVA: &str = "#!/bin/sh\nexec sleep 30\n";

fn scratch(name: &str) -> PathBuf {
    let dir = std::env::temp_dir().join(format!("modlaunch-it-{}-{}", name, std::process::id()));
    let _ = std::fs::remove_dir_all(&dir);
    std::fs::create_dir_all(&dir).unwrap();
    dir
}

fn fake_java(dir: &Path, body: &str) -> PathBuf {
    let path = dir.join("java");
    std::fs::write(&path, body).unwrap();
    std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755)).unwrap();
    path
}

fn linux_x64() -> RuleContext {
    RuleContext {
        os_name: "linux".into(),
        os_release: "6.5.0".into(),
        arch: "x64".into(),
        fullscreen: false,
    }
}

fn natives_left(temp: &Path) -> usize {
    std::fs::read_dir(temp.join(NATIVES_FOLDER))
        .map(|entries| entries.count())
        .unwrap_or(0)
}

struct Output {
    stdout: Vec<String>,
    stderr: Vec<String>,
    code: Option<i32>,
}

async fn collect(mut handle: LaunchHandle) -> Output {
    let mut output = Output {
        stdout: Vec::new(),
        stderr: Vec::new(),
        code: None,
    };
    while let Some(event) = handle.next_event().await {
        match event {
            LaunchEvent::Stdout(line) => output.stdout.push(line),
            LaunchEvent::Stderr(line) => output.stderr.push(line),
            LaunchEvent::Exited { code, .. } => output.code = code,
        }
    }
    output
}

fn legacy_request(temp: &Path, java: &Path) -> LaunchRequest {
    serde_json::from_value(serde_json::json!({
        "server": {
            "id": "Legacy",
            "hostname": "mc.example.com",
            "port": 25570,
            "autoconnect": true,
            "minecraftVersion": "1.12.2",
            "modules": [
                {
                    "id": "net.minecraftforge:forge:1.12.2-14.23.5.2854:universal",
                    "type": "ForgeHosted",
                    "localPath": temp.join("common/libraries/forge.jar")
                },
                {
                    "id": "com.example:optifine:1.0",
                    "type": "ForgeMod",
                    "required": {"value": false, "def": true},
                    "localPath": temp.join("common/modstore/optifine.jar")
                }
            ]
        },
        "vanillaManifest": {
            "id": "1.12.2",
            "mainClass": "net.minecraft.client.main.Main",
            "assets": "1.12",
            "libraries": [
                {"name": "com.google.guava:guava:21.0",
                 "downloads": {"artifact": {"path": "com/google/guava/guava-21.0.jar"}}}
            ]
        },
        "modManifest": {
            "id": "1.12.2-forge-14.23.5.2854",
            "mainClass": "net.minecraft.launchwrapper.Launch",
            "minecraftArguments": "--username ${auth_player_name} --gameDir ${game_directory} --tweakClass net.minecraftforge.fml.common.launcher.FMLTweaker"
        },
        "account": {
            "displayName": " Steve ",
            "uuid": "069a79f444e94726a5befca90e38aaf5",
            "accessToken": "token",
            "type": "microsoft"
        },
        "settings": {
            "javaExecutable": java,
            "minRam": "1G",
            "maxRam": "2G",
            "jvmOptions": [],
            "launchDetached": false
        },
        "directories": {
            "commonDir": temp.join("common"),
            "instancesDir": temp.join("instances"),
            "tempRoot": temp
        }
    }))
    .unwrap()
}

#[tokio::test]
async fn legacy_forge_launch_end_to_end() {
    let temp = scratch("legacy");
    let java = fake_java(&temp, ECHO_JAVA);
    let orchestrator = LaunchOrchestrator::from_request(legacy_request(&temp, &java))
        .unwrap()
        .with_rule_context(linux_x64());

    let output = collect(orchestrator.launch().await.unwrap()).await;
    assert_eq!(output.code, Some(0));

    let args = output.stdout;
    assert_eq!(args[0], "-cp");
    assert!(args[1].contains("forge.jar"));
    assert!(args[1].contains("guava-21.0.jar"));
    assert_eq!(&args[2..4], ["-Xmx2G", "-Xms1G"]);
    assert!(args[4].starts_with("-Djava.library.path="));
    assert_eq!(args[5], "net.minecraft.launchwrapper.Launch");
    assert_eq!(&args[6..8], ["--username", "Steve"]);

    let tail = &args[args.len() - 10..];
    assert_eq!(
        tail[..8],
        ["--server", "mc.example.com", "--port", "25570", "--width", "1280", "--height", "720"]
    );
    assert_eq!(tail[8], "--modListFile");

    let game_dir = temp.join("instances/Legacy");
    let list_path = game_dir.join("forgeModList.json");
    assert_eq!(tail[9], format!("absolute:{}", list_path.to_string_lossy()));
    let list: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(&list_path).unwrap()).unwrap();
    assert_eq!(list["modRef"], serde_json::json!(["com.example:optifine:1.0"]));

    assert_eq!(natives_left(&temp), 0);
    assert!(!orchestrator.is_launching());

    let _ = std::fs::remove_dir_all(&temp);
}

#[tokio::test]
async fn modern_fabric_launch_extracts_natives_and_writes_mod_list() {
    let temp = scratch("fabric");
    let java = fake_java(&temp, ECHO_JAVA);

    let native_jar = temp.join("common/libraries/org/lwjgl/lwjgl-3.3.1-natives-linux.jar");
    std::fs::create_dir_all(native_jar.parent().unwrap()).unwrap();
    let mut writer = zip::ZipWriter::new(File::create(&native_jar).unwrap());
    writer.start_file("linux/x64/org/lwjgl/liblwjgl.so", SimpleFileOptions::default()).unwrap();
    writer.write_all(b"elf").unwrap();
    writer.start_file("META-INF/MANIFEST.MF", SimpleFileOptions::default()).unwrap();
    writer.write_all(b"manifest").unwrap();
    writer.finish().unwrap();

    let mod_path = temp.join("common/modstore/fabric-api.jar");
    let mut request: LaunchRequest = serde_json::from_value(serde_json::json!({
        "server": {
            "id": "Modern",
            "hostname": "localhost",
            "autoconnect": true,
            "minecraftVersion": "1.20.1",
            "modules": [
                {"id": "net.fabricmc:fabric-loader:0.15.0", "type": "Fabric",
                 "localPath": temp.join("common/libraries/fabric-loader.jar")},
                {"id": "net.fabricmc:fabric-api:0.92.0", "type": "FabricMod", "localPath": mod_path}
            ]
        },
        "vanillaManifest": {
            "id": "1.20.1",
            "mainClass": "net.minecraft.client.main.Main",
            "assets": "5",
            "arguments": {
                "jvm": ["-Djava.library.path=${natives_directory}", "-cp", "${classpath}"],
                "game": ["--username", "${auth_player_name}", "--version", "${version_name}"]
            },
            "libraries": [
                {"name": "org.lwjgl:lwjgl:3.3.1",
                 "downloads": {"artifact": {"path": "org/lwjgl/lwjgl-3.3.1.jar"}}},
                {"name": "org.lwjgl:lwjgl:3.3.1:natives-linux",
                 "rules": [{"action": "allow", "os": {"name": "linux"}}],
                 "downloads": {"artifact": {"path": "org/lwjgl/lwjgl-3.3.1-natives-linux.jar"}}}
            ]
        },
        "modManifest": {
            "id": "fabric-loader-0.15.0-1.20.1",
            "mainClass": "net.fabricmc.loader.impl.launch.knot.KnotClient",
            "arguments": {"jvm": [], "game": []}
        },
        "account": {
            "displayName": "Alex",
            "uuid": "uuid",
            "accessToken": "token",
            "type": "mojang"
        },
        "settings": {
            "javaExecutable": java,
            "jvmOptions": [],
            "syncLanguage": true,
            "language": "de_DE",
            "launchDetached": false
        },
        "directories": {
            "commonDir": temp.join("common"),
            "instancesDir": temp.join("instances"),
            "tempRoot": temp
        }
    }))
    .unwrap();
    request.launcher_version = "9.9.9".into();

    let orchestrator = LaunchOrchestrator::from_request(request)
        .unwrap()
        .with_rule_context(linux_x64());
    let output = collect(orchestrator.launch().await.unwrap()).await;
    assert_eq!(output.code, Some(0));

    let args = output.stdout;
    let game_dir = temp.join("instances/Modern");
    let list_path = game_dir.join("forgeMods.list");

    let add_mods = args.iter().position(|arg| arg == "--fabric.addMods").unwrap();
    assert_eq!(args[add_mods + 1], format!("@{}", list_path.to_string_lossy()));
    let quickplay = args.iter().position(|arg| arg == "--quickPlayMultiplayer").unwrap();
    assert_eq!(args[quickplay + 1], "localhost:25565");
    assert!(!args.iter().any(|arg| arg.starts_with("--fml.")));

    let cp = args.iter().position(|arg| arg == "-cp").unwrap();
    assert!(args[cp + 1].contains("1.20.1.jar"));
    assert!(args[cp + 1].contains("lwjgl-3.3.1.jar"));
    assert!(!args[cp + 1].contains("natives-linux"));

    assert!(output.stderr.contains(&"liblwjgl.so".to_string()));
    assert!(!output.stderr.contains(&"MANIFEST.MF".to_string()));

    assert_eq!(
        std::fs::read_to_string(&list_path).unwrap(),
        mod_path.to_string_lossy()
    );
    assert_eq!(
        std::fs::read_to_string(game_dir.join("options.txt")).unwrap(),
        "lang:de_de\n"
    );
    assert_eq!(natives_left(&temp), 0);

    let _ = std::fs::remove_dir_all(&temp);
}

#[tokio::test]
async fn second_launch_is_rejected_while_running() {
    let temp = scratch("busy");
    let java = fake_java(&temp, SLOW_JAVA);
    let orchestrator = LaunchOrchestrator::from_request(legacy_request(&temp, &java))
        .unwrap()
        .with_rule_context(linux_x64());

    let mut running = orchestrator.launch().await.unwrap();
    assert!(orchestrator.is_launching());
    assert!(matches!(
        orchestrator.launch().await,
        Err(LauncherError::LaunchInProgress)
    ));
    assert_eq!(natives_left(&temp), 1);

    assert!(running.kill());
    let (_, signal) = running.wait().await.unwrap();
    assert_eq!(signal, Some(9));
    assert!(!orchestrator.is_launching());
    assert_eq!(natives_left(&temp), 0);

    let mut again = orchestrator.launch().await.unwrap();
    again.kill();
    again.wait().await.unwrap();

    let _ = std::fs::remove_dir_all(&temp);
}

#[tokio::test]
async fn spawn_failure_cleans_up() {
    let temp = scratch("spawn-fail");
    let missing_java = temp.join("no-java-here");
    let orchestrator = LaunchOrchestrator::from_request(legacy_request(&temp, &missing_java))
        .unwrap()
        .with_rule_context(linux_x64());

    let err = orchestrator.launch().await.unwrap_err();
    assert!(matches!(err, LauncherError::JavaExecution(_)));
    assert_eq!(natives_left(&temp), 0);
    assert!(!orchestrator.is_launching());

    let _ = std::fs::remove_dir_all(&temp);
}
