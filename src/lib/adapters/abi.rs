use alloy::sol;

sol! {
    #[sol(rpc)]
    interface IGreeters {
        function greet(
            bytes32 greeting,
            uint256 nullifierHash,
            uint256[8] calldata proof
        ) external;

        event NewGreeting(bytes32 greeting);
    }
}
