//! Contract interfaces the relayer encodes calls for.

use alloy::sol;

sol! {
	/// Intent as passed to the router's entry point.
	struct RouterIntent {
		address user;
		address tokenIn;
		uint256 amtIn;
		address tokenOut;
		uint256 minOut;
		uint64 dstChainId;
		uint64 deadline;
		address feeToken;
		uint8 feeMode;
		uint256 feeCapToken;
		bytes routeHint;
		uint256 nonce;
	}

	/// Router that pulls the user's tokens, calls the adapter, and forwards
	/// the output.
	interface IRouterHub {
		function executeRoute(RouterIntent intent, address adapter, bytes routeData) external returns (uint256);
	}

	/// Adapter wrapping a single swap or bridge protocol.
	interface ISwapAdapter {
		function swap(address tokenIn, address tokenOut, uint256 amountIn, uint256 minAmountOut, address recipient, uint256 deadline) external returns (uint256);
	}

	interface IERC20 {
		function approve(address spender, uint256 amount) external returns (bool);
	}
}
