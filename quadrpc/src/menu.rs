use std::str::FromStr;

pub const MENU: &str = "
1. Unary RPC
2. Client Stream RPC
3. Server Stream RPC
4. Bidirectional Stream RPC
5. Repeated Stream RPC (persistent session)
6. Exit
Enter your choice: ";

/// An entry of the interactive client's menu.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Choice {
    Unary,
    ClientStream,
    ServerStream,
    Bidirectional,
    RepeatedStream,
    Exit,
}

impl FromStr for Choice {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim() {
            "1" => Ok(Self::Unary),
            "2" => Ok(Self::ClientStream),
            "3" => Ok(Self::ServerStream),
            "4" => Ok(Self::Bidirectional),
            "5" => Ok(Self::RepeatedStream),
            "6" => Ok(Self::Exit),
            other => Err(format!(
                "Invalid choice '{other}'. Expected a number from 1 to 6"
            )),
        }
    }
}
